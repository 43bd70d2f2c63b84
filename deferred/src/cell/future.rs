use super::core::Deferred;

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by awaiting a [`Deferred`].
///
/// Resolves to the cell's result once it settles. Dropping the future only
/// discards the ability to observe the result; the cell is unaffected.
pub struct Settled<T, E>
where
    T: 'static,
    E: 'static,
{
    deferred: Deferred<T, E>,
}

impl<T, E> Future for Settled<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = Result<T, E>;

    /// Returns the result if the cell has settled, otherwise registers the
    /// current waker.
    ///
    /// The state check and the waker registration happen under the same
    /// lock as settlement, so a wake-up cannot be missed.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.deferred.cell.slot.lock();

        if let Some(outcome) = slot.state.outcome() {
            return Poll::Ready(outcome);
        }

        if !slot.waiters.iter().any(|w| w.will_wake(cx.waker())) {
            slot.waiters.push(cx.waker().clone());
        }

        Poll::Pending
    }
}

impl<T, E> IntoFuture for Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = Settled<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        Settled { deferred: self }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Blocks the current thread until the cell settles.
    ///
    /// A cell that never settles blocks forever.
    pub fn wait(&self) -> Result<T, E> {
        let mut slot = self.cell.slot.lock();

        loop {
            if let Some(outcome) = slot.state.outcome() {
                return outcome;
            }

            self.cell.settled.wait(&mut slot);
        }
    }
}
