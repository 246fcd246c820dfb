//! Ordered handler decoration.

/// A wrapping transformation applied to a handler at registration time.
pub type Decorator<H> = Box<dyn FnOnce(H) -> H + Send>;

/// Apply `decorators` to `handler` head to tail.
///
/// Each decorator receives the previous decorator's result, so the last one
/// in the list ends up outermost.
pub fn apply_decorators<H, I>(handler: H, decorators: I) -> H
where
    I: IntoIterator<Item = Decorator<H>>,
{
    decorators
        .into_iter()
        .fold(handler, |handler, decorator| decorator(handler))
}
