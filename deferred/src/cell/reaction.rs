/// A queued reaction pair.
///
/// Each branch is closed over a consumer's handler and the consumer's own
/// settlement capabilities. Exactly one branch runs, exactly once, when the
/// source cell settles; the other is dropped unused.
pub(crate) struct Reaction<T, E> {
    on_fulfilled: Box<dyn FnOnce(T) + Send>,
    on_rejected: Box<dyn FnOnce(E) + Send>,
}

impl<T, E> Reaction<T, E> {
    pub(crate) fn new<F, R>(on_fulfilled: F, on_rejected: R) -> Self
    where
        F: FnOnce(T) + Send + 'static,
        R: FnOnce(E) + Send + 'static,
    {
        Self {
            on_fulfilled: Box::new(on_fulfilled),
            on_rejected: Box::new(on_rejected),
        }
    }

    /// Runs the branch matching the settled outcome.
    pub(crate) fn fire(self, outcome: Result<T, E>) {
        match outcome {
            Ok(value) => (self.on_fulfilled)(value),
            Err(reason) => (self.on_rejected)(reason),
        }
    }
}
