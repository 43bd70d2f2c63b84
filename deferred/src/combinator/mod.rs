//! Construction shortcuts and fan-in combinators.
//!
//! - [`Deferred::resolve`] / [`Deferred::resolve_from`] build a fulfilled
//!   cell, or one that follows another cell.
//! - [`Deferred::reject`] builds a rejected cell.
//! - [`Deferred::all`] waits for every input, failing fast.
//! - [`Deferred::race`] settles like whichever input settles first.
//!
//! Every combinator is built from the public `then` contract of its inputs;
//! none of them reaches into another cell's state. A combinator over input
//! cells takes its configuration from the first input, while `resolve` and
//! `reject` have no input and use the default one.

mod all;
mod race;

use crate::cell::{Deferred, Resolution, adopt};

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Returns a cell already fulfilled with `value`.
    pub fn resolve(value: T) -> Self {
        Deferred::new(|resolver, _| {
            resolver.resolve(value);
            Ok(())
        })
    }

    /// Returns a cell settled by `resolution`.
    ///
    /// A plain value fulfils the cell immediately. A deferred value is
    /// mirrored: the new cell fulfils or rejects exactly as it does, and
    /// shares its configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferred::Deferred;
    ///
    /// let source = Deferred::<i32, String>::reject("gone".to_string());
    /// let mirror = Deferred::resolve_from(source);
    /// assert_eq!(mirror.wait(), Err("gone".to_string()));
    /// ```
    pub fn resolve_from(resolution: impl Into<Resolution<T, E>>) -> Self {
        match resolution.into() {
            Resolution::Value(value) => Deferred::resolve(value),
            Resolution::Deferred(source) => source.derive(|resolver, rejecter| {
                adopt(&source, resolver, rejecter);
                Ok(())
            }),
        }
    }

    /// Returns a cell already rejected with `reason`.
    pub fn reject(reason: E) -> Self {
        Deferred::new(|_, rejecter| {
            rejecter.reject(reason);
            Ok(())
        })
    }
}
