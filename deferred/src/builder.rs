use crate::cell::{Deferred, Rejecter, Resolver};
use crate::error::Panicked;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

/// Per-cell settings, inherited by every cell derived through `then`.
pub(crate) struct Config<E> {
    pub(crate) label: Option<Arc<str>>,

    /// Turns a captured panic into a rejection reason. `None` lets panics
    /// unwind.
    pub(crate) on_panic: Option<fn(Panicked) -> E>,
}

impl<E> Config<E> {
    /// Runs caller-supplied code (an executor or a handler).
    ///
    /// With a panic converter installed, a panic is turned into
    /// `Err(on_panic(..))` instead of unwinding into the settlement
    /// machinery.
    pub(crate) fn guard<R, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce() -> Result<R, E>,
    {
        let Some(on_panic) = self.on_panic else {
            return f();
        };

        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(payload) => {
                let panicked = Panicked::from_payload(payload);
                warn!(
                    label = self.label.as_deref().unwrap_or("unnamed"),
                    panic = panicked.message(),
                    "panic converted into rejection"
                );
                Err(on_panic(panicked))
            }
        }
    }
}

impl<E> Default for Config<E> {
    fn default() -> Self {
        Self {
            label: None,
            on_panic: None,
        }
    }
}

impl<E> Clone for Config<E> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            on_panic: self.on_panic,
        }
    }
}

impl<E> fmt::Debug for Config<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("label", &self.label)
            .field("catch_panics", &self.on_panic.is_some())
            .finish()
    }
}

/// Builder for configuring and creating a [`Deferred`].
///
/// `DeferredBuilder` allows customizing a cell before its executor runs.
/// The settings carry over to every cell derived from it through
/// [`then`](Deferred::then), the methods built on it, and the combinators
/// that take it as their first input.
///
/// The builder is parameterised by the reason type `E` because converting a
/// panic into a rejection needs a way to build an `E`.
///
/// # Examples
///
/// ```rust
/// use deferred::{DeferredBuilder, Reason};
///
/// let fetch = DeferredBuilder::<Reason>::new()
///     .label("fetch-user")
///     .catch_panics()
///     .build::<u32, _>(|resolve, _reject| {
///         resolve.resolve(7);
///         Ok(())
///     });
///
/// assert_eq!(fetch.label(), Some("fetch-user"));
/// assert_eq!(fetch.wait().ok(), Some(7));
///
/// let broken = fetch.map(|_| -> u32 { panic!("lookup failed") });
/// assert!(matches!(broken.wait(), Err(reason) if reason.is_panic()));
/// ```
pub struct DeferredBuilder<E> {
    config: Config<E>,
}

impl<E> DeferredBuilder<E> {
    /// Creates a builder with default configuration.
    ///
    /// By default the cell is unnamed and panics raised by executors or
    /// handlers unwind into whichever call ran them.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Names the cell in emitted `tracing` events.
    pub fn label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Turns panics in executors and handlers into rejections built by
    /// `convert`.
    pub fn catch_panics_with(mut self, convert: fn(Panicked) -> E) -> Self {
        self.config.on_panic = Some(convert);
        self
    }

    /// Builds the cell and runs `executor` synchronously.
    pub fn build<T, X>(self, executor: X) -> Deferred<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        X: FnOnce(Resolver<T, E>, Rejecter<T, E>) -> Result<(), E>,
    {
        Deferred::with_config(self.config, executor)
    }
}

impl<E: From<Panicked>> DeferredBuilder<E> {
    /// Turns panics in executors and handlers into rejections, using the
    /// reason type's `From<Panicked>` conversion.
    pub fn catch_panics(self) -> Self {
        self.catch_panics_with(<E as From<Panicked>>::from)
    }
}

impl<E> Default for DeferredBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for DeferredBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl<E> fmt::Debug for DeferredBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredBuilder")
            .field("config", &self.config)
            .finish()
    }
}
