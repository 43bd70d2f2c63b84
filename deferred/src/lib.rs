//! # Deferred
//!
//! **Deferred** is a settle-once value container: it starts out pending, is
//! settled exactly once with either a success value or a failure reason, and
//! lets any number of observers react to that settlement, whether they
//! attach before or after it happens.
//!
//! The crate does not schedule anything. Reactions run synchronously inside
//! whichever call settles the cell, or immediately when attached to a cell
//! that has already settled. That makes it usable from plain threads, from
//! I/O callbacks, or from inside an async runtime.
//!
//! It offers:
//!
//! - **Settle-once cells** with cloneable, thread-safe settlement capabilities
//! - **Chaining** through [`Deferred::then`], with value and rejection
//!   pass-through and flattening of returned cells
//! - **Failure conversion**: an executor or handler returning `Err` rejects
//!   the downstream cell; panics do too when opted into through
//!   [`DeferredBuilder`]
//! - **Unbounded chains**: settling or dropping a chain of any length runs
//!   in constant stack space
//! - **Fan-in** through [`Deferred::all`] and [`Deferred::race`], plus the
//!   heterogeneous [`all!`] and [`race!`] macros
//! - **Observation** by `.await`, by blocking [`Deferred::wait`], or by
//!   polling [`Deferred::peek`]
//!
//! ## Quick Start
//!
//! ```rust
//! use deferred::{Deferred, Resolution};
//! use std::thread;
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//!
//! let answer = Deferred::<u32, String>::new(move |resolve, _reject| {
//!     tx.send(resolve).map_err(|e| e.to_string())
//! });
//!
//! let doubled = answer
//!     .then_ok(|v| Ok(Resolution::Value(v * 2)))
//!     .catch(|reason| Err(format!("lookup failed: {reason}")));
//!
//! thread::spawn(move || {
//!     let resolve = rx.recv().unwrap();
//!     resolve.resolve(21);
//! });
//!
//! assert_eq!(doubled.wait(), Ok(42));
//! ```
//!
//! ## Modules
//!
//! - [`error`]: failure payload helpers ([`Panicked`], [`Reason`])
//!
//! ## Getting Started
//!
//! Add Deferred to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! deferred = { git = "https://github.com/Nebula-ecosystem/Deferred", package = "deferred" }
//! ```

mod builder;
mod cell;
mod combinator;

pub mod error;

pub use builder::DeferredBuilder;
pub use cell::{Deferred, Rejecter, Resolution, Resolver, Settled, Status};
pub use error::{Panicked, Reason};

pub use deferred_macros::*;

#[doc(hidden)]
pub mod __private {
    pub use parking_lot::Mutex;

    use crate::{Deferred, Rejecter, Resolver};

    /// Builds a cell sharing `source`'s configuration, for macro expansions.
    pub fn derive<T, U, E, X>(source: &Deferred<T, E>, executor: X) -> Deferred<U, E>
    where
        T: Clone + Send + 'static,
        U: Clone + Send + 'static,
        E: Clone + Send + 'static,
        X: FnOnce(Resolver<U, E>, Rejecter<U, E>) -> Result<(), E>,
    {
        source.derive(executor)
    }
}
