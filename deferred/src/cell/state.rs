/// Observable lifecycle stage of a [`Deferred`](crate::Deferred).
///
/// `Pending` is the initial stage. `Fulfilled` and `Rejected` are terminal:
/// once a cell reaches one of them it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Not settled yet; reactions are queued.
    Pending,

    /// Settled with a success value.
    Fulfilled,

    /// Settled with a failure reason.
    Rejected,
}

impl Status {
    pub fn is_pending(self) -> bool {
        self == Status::Pending
    }

    pub fn is_settled(self) -> bool {
        !self.is_pending()
    }
}

/// The settlement slot together with its stored result.
///
/// The result only exists once the cell has settled, so it lives inside the
/// terminal variants rather than beside the tag.
pub(crate) enum State<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T: Clone, E: Clone> State<T, E> {
    pub(crate) fn status(&self) -> Status {
        match self {
            State::Pending => Status::Pending,
            State::Fulfilled(_) => Status::Fulfilled,
            State::Rejected(_) => Status::Rejected,
        }
    }

    /// A copy of the stored result, or `None` while pending.
    pub(crate) fn outcome(&self) -> Option<Result<T, E>> {
        match self {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}
