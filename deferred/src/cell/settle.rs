use super::core::Deferred;
use crate::builder::Config;

use std::fmt;

/// Capability to fulfil one particular [`Deferred`].
///
/// Handed to the executor at construction. It can be cloned and sent to
/// other threads; whichever capability call comes first settles the cell and
/// every later call, through any clone, is a no-op.
pub struct Resolver<T, E>
where
    T: 'static,
    E: 'static,
{
    deferred: Deferred<T, E>,
}

/// Capability to reject one particular [`Deferred`].
///
/// See [`Resolver`]; the same at-most-once rule spans both capabilities.
pub struct Rejecter<T, E>
where
    T: 'static,
    E: 'static,
{
    deferred: Deferred<T, E>,
}

impl<T: 'static, E: 'static> Resolver<T, E> {
    pub(crate) fn new(deferred: Deferred<T, E>) -> Self {
        Self { deferred }
    }

    pub(crate) fn config(&self) -> &Config<E> {
        &self.deferred.cell.config
    }
}

impl<T: 'static, E: 'static> Rejecter<T, E> {
    pub(crate) fn new(deferred: Deferred<T, E>) -> Self {
        Self { deferred }
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Fulfils the cell with `value`.
    ///
    /// Queued reactions have run by the time the outermost settlement on
    /// this thread returns. Returns `false` if the cell had already settled,
    /// in which case nothing happens.
    pub fn resolve(&self, value: T) -> bool {
        self.deferred.settle(Ok(value))
    }

    /// A handle to the cell this capability settles.
    pub fn deferred(&self) -> Deferred<T, E> {
        self.deferred.clone()
    }
}

impl<T, E> Rejecter<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Rejects the cell with `reason`.
    ///
    /// Returns `false` if the cell had already settled.
    pub fn reject(&self, reason: E) -> bool {
        self.deferred.settle(Err(reason))
    }

    pub fn deferred(&self) -> Deferred<T, E> {
        self.deferred.clone()
    }
}

impl<T: 'static, E: 'static> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
        }
    }
}

impl<T: 'static, E: 'static> Clone for Rejecter<T, E> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
        }
    }
}

impl<T: 'static, E: 'static> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("label", &self.deferred.label())
            .finish_non_exhaustive()
    }
}

impl<T: 'static, E: 'static> fmt::Debug for Rejecter<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter")
            .field("label", &self.deferred.label())
            .finish_non_exhaustive()
    }
}
