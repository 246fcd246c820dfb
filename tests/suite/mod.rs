mod binary;
mod dispatch;
