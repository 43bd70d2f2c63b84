use super::dispatch::{self, Job};
use super::reaction::Reaction;
use super::resolution::{self, Resolution};
use super::settle::{Rejecter, Resolver};
use super::state::{State, Status};
use crate::builder::{Config, DeferredBuilder};

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::task::Waker;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

/// A value that will be settled exactly once, later.
///
/// A `Deferred` starts out pending and is settled either with a success value
/// (`Fulfilled`) or a failure reason (`Rejected`). Reactions attached with
/// [`then`](Self::then) before settlement are queued and run, in
/// registration order, by whichever call performs the settlement. Reactions
/// attached afterwards run immediately.
///
/// `Deferred` is a cheap handle: cloning it yields another handle to the
/// same cell. The cell is freed with its last handle or capability; a
/// pending cell freed that way simply never settles.
pub struct Deferred<T, E>
where
    T: 'static,
    E: 'static,
{
    pub(crate) cell: Arc<Cell<T, E>>,
}

/// The shared settlement slot behind every handle and capability.
pub(crate) struct Cell<T, E>
where
    T: 'static,
    E: 'static,
{
    pub(crate) config: Config<E>,

    /// State, result and queued reactions. Every settlement and every
    /// registration happens under this lock.
    pub(crate) slot: Mutex<Slot<T, E>>,

    /// Signalled once the state leaves `Pending`.
    pub(crate) settled: Condvar,
}

pub(crate) struct Slot<T, E> {
    pub(crate) state: State<T, E>,

    /// Reactions waiting for settlement, in registration order.
    pub(crate) reactions: Vec<Reaction<T, E>>,

    /// Wakers of futures awaiting this cell.
    pub(crate) waiters: Vec<Waker>,
}

impl<T: 'static, E: 'static> Drop for Cell<T, E> {
    /// A pending cell owns the reactions of the cells chained behind it.
    /// They are retired rather than dropped in place so that freeing a long
    /// chain does not recurse once per link.
    fn drop(&mut self) {
        let reactions = mem::take(&mut self.slot.get_mut().reactions);

        if !reactions.is_empty() {
            dispatch::retire(Box::new(reactions));
        }
    }
}

impl<T: 'static, E: 'static> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a pending cell and runs `executor` synchronously.
    ///
    /// The executor receives the two settlement capabilities. It may use one
    /// of them right away, hand them off to be used later from anywhere, or
    /// never use them at all. If the executor returns `Err(reason)` the cell
    /// is rejected with that reason, unless it was already settled.
    ///
    /// A panicking executor unwinds into the caller. Use
    /// [`DeferredBuilder::catch_panics`] to turn panics into rejections.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferred::Deferred;
    ///
    /// let d = Deferred::<i32, String>::new(|resolve, _reject| {
    ///     resolve.resolve(42);
    ///     Ok(())
    /// });
    /// assert_eq!(d.wait(), Ok(42));
    /// ```
    pub fn new<X>(executor: X) -> Self
    where
        X: FnOnce(Resolver<T, E>, Rejecter<T, E>) -> Result<(), E>,
    {
        DeferredBuilder::new().build(executor)
    }

    /// Creates a pending cell and returns it with its capabilities.
    ///
    /// Shorthand for an executor that only hands the capabilities out.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferred::Deferred;
    ///
    /// let (d, resolve, _reject) = Deferred::<&str, String>::pending();
    /// assert!(d.is_pending());
    ///
    /// resolve.resolve("ready");
    /// assert_eq!(d.peek(), Some(Ok("ready")));
    /// ```
    pub fn pending() -> (Self, Resolver<T, E>, Rejecter<T, E>) {
        let deferred = Deferred::new(|_, _| Ok(()));
        let resolver = Resolver::new(deferred.clone());
        let rejecter = Rejecter::new(deferred.clone());
        (deferred, resolver, rejecter)
    }

    pub(crate) fn with_config<X>(config: Config<E>, executor: X) -> Self
    where
        X: FnOnce(Resolver<T, E>, Rejecter<T, E>) -> Result<(), E>,
    {
        let deferred = Deferred {
            cell: Arc::new(Cell {
                config,
                slot: Mutex::new(Slot {
                    state: State::Pending,
                    reactions: Vec::new(),
                    waiters: Vec::new(),
                }),
                settled: Condvar::new(),
            }),
        };

        trace!(label = deferred.label_or_default(), "deferred created");

        let resolver = Resolver::new(deferred.clone());
        let rejecter = Rejecter::new(deferred.clone());

        if let Err(reason) = deferred
            .cell
            .config
            .guard(move || executor(resolver, rejecter))
        {
            deferred.settle(Err(reason));
        }

        deferred
    }

    /// Builds a cell that shares this cell's configuration.
    pub(crate) fn derive<U, X>(&self, executor: X) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        X: FnOnce(Resolver<U, E>, Rejecter<U, E>) -> Result<(), E>,
    {
        Deferred::with_config(self.cell.config.clone(), executor)
    }

    /// Moves the cell out of `Pending`, then dispatches its reactions.
    ///
    /// Returns `false`, and does nothing else, if the cell had already
    /// settled. Reactions go through the thread's dispatch queue: they have
    /// all run when the outermost settlement on this thread returns.
    pub(crate) fn settle(&self, outcome: Result<T, E>) -> bool {
        let (reactions, waiters) = {
            let mut slot = self.cell.slot.lock();

            if !matches!(slot.state, State::Pending) {
                trace!(
                    label = self.label_or_default(),
                    "settlement ignored, already settled"
                );
                return false;
            }

            slot.state = match &outcome {
                Ok(value) => State::Fulfilled(value.clone()),
                Err(reason) => State::Rejected(reason.clone()),
            };

            (
                mem::take(&mut slot.reactions),
                mem::take(&mut slot.waiters),
            )
        };

        self.cell.settled.notify_all();

        trace!(
            label = self.label_or_default(),
            fulfilled = outcome.is_ok(),
            reactions = reactions.len(),
            "deferred settled"
        );

        dispatch::schedule(reactions.into_iter().map(|reaction| {
            let outcome = outcome.clone();
            Box::new(move || reaction.fire(outcome)) as Job
        }));

        for waker in waiters {
            waker.wake();
        }

        true
    }

    /// Attaches a pair of handlers and returns the cell they settle.
    ///
    /// Exactly one handler runs, once, with this cell's result:
    /// `on_fulfilled` with the value or `on_rejected` with the reason. What
    /// the handler returns decides the returned cell:
    ///
    /// - `Ok(Resolution::Value(v))` fulfils it with `v`;
    /// - `Ok(Resolution::Deferred(d))` makes it follow `d`, however deeply
    ///   `d` is itself chained;
    /// - `Err(reason)` rejects it with `reason`, as does a panic when the
    ///   cell was built with panic catching.
    ///
    /// If this cell is already settled the handler runs before `then`
    /// returns; otherwise it runs during the call that settles this cell.
    /// The returned cell inherits this cell's configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferred::{Deferred, Resolution};
    ///
    /// let d = Deferred::<i32, String>::resolve(2)
    ///     .then(
    ///         |v| Ok(Resolution::Value(v * 10)),
    ///         |_reason| Ok(Resolution::Value(0)),
    ///     );
    /// assert_eq!(d.wait(), Ok(20));
    /// ```
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Resolution<U, E>, E> + Send + 'static,
        R: FnOnce(E) -> Result<Resolution<U, E>, E> + Send + 'static,
    {
        self.derive(|resolver, rejecter| {
            self.subscribe(on_fulfilled, on_rejected, resolver, rejecter);
            Ok(())
        })
    }

    /// Queues the handler pair, or runs the matching handler right away if
    /// this cell has already settled.
    fn subscribe<U, F, R>(
        &self,
        on_fulfilled: F,
        on_rejected: R,
        resolver: Resolver<U, E>,
        rejecter: Rejecter<U, E>,
    ) where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Resolution<U, E>, E> + Send + 'static,
        R: FnOnce(E) -> Result<Resolution<U, E>, E> + Send + 'static,
    {
        let outcome = {
            let mut slot = self.cell.slot.lock();

            match slot.state.outcome() {
                Some(outcome) => outcome,
                None => {
                    let on_fulfilled_resolver = resolver.clone();
                    let on_fulfilled_rejecter = rejecter.clone();

                    slot.reactions.push(Reaction::new(
                        move |value| {
                            resolution::run(
                                on_fulfilled,
                                value,
                                on_fulfilled_resolver,
                                on_fulfilled_rejecter,
                            )
                        },
                        move |reason| resolution::run(on_rejected, reason, resolver, rejecter),
                    ));

                    trace!(
                        label = self.label_or_default(),
                        queued = slot.reactions.len(),
                        "reaction queued"
                    );
                    return;
                }
            }
        };

        trace!(
            label = self.label_or_default(),
            fulfilled = outcome.is_ok(),
            "reaction dispatched immediately"
        );

        match outcome {
            Ok(value) => resolution::run(on_fulfilled, value, resolver, rejecter),
            Err(reason) => resolution::run(on_rejected, reason, resolver, rejecter),
        }
    }

    /// Attaches a success handler; a rejection passes through unchanged.
    pub fn then_ok<U, F>(&self, on_fulfilled: F) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Resolution<U, E>, E> + Send + 'static,
    {
        self.then(on_fulfilled, resolution::rethrow)
    }

    /// Attaches a failure handler; a success value passes through unchanged.
    ///
    /// This is exactly `then(identity, on_rejected)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferred::{Deferred, Resolution};
    ///
    /// let recovered = Deferred::<i32, String>::reject("lost".to_string())
    ///     .then_ok(|v| Ok(Resolution::Value(v + 1)))
    ///     .catch(|reason| Ok(Resolution::Value(reason.len() as i32)));
    /// assert_eq!(recovered.wait(), Ok(4));
    /// ```
    pub fn catch<R>(&self, on_rejected: R) -> Deferred<T, E>
    where
        R: FnOnce(E) -> Result<Resolution<T, E>, E> + Send + 'static,
    {
        self.then(resolution::identity, on_rejected)
    }

    /// Returns a cell that settles exactly like this one.
    ///
    /// Equivalent to `then` with neither handler supplied.
    pub fn forward(&self) -> Deferred<T, E> {
        self.then(resolution::identity, resolution::rethrow)
    }

    /// Transforms the success value.
    pub fn map<U, F>(&self, f: F) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then_ok(move |value| Ok(Resolution::Value(f(value))))
    }

    /// Transforms the success value with a fallible function.
    pub fn try_map<U, F>(&self, f: F) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.then_ok(move |value| f(value).map(Resolution::Value))
    }

    /// Chains another deferred computation onto the success value.
    pub fn and_then<U, F>(&self, f: F) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Deferred<U, E> + Send + 'static,
    {
        self.then_ok(move |value| Ok(Resolution::Deferred(f(value))))
    }

    pub fn status(&self) -> Status {
        self.cell.slot.lock().state.status()
    }

    pub fn is_pending(&self) -> bool {
        self.status().is_pending()
    }

    pub fn is_settled(&self) -> bool {
        self.status().is_settled()
    }

    /// A copy of the result if the cell has settled.
    pub fn peek(&self) -> Option<Result<T, E>> {
        self.cell.slot.lock().state.outcome()
    }
}

impl<T: 'static, E: 'static> Deferred<T, E> {
    /// The label given through [`DeferredBuilder::label`], if any.
    pub fn label(&self) -> Option<&str> {
        self.cell.config.label.as_deref()
    }

    /// Returns `true` if both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    fn label_or_default(&self) -> &str {
        self.label().unwrap_or("unnamed")
    }
}

impl<T, E> fmt::Debug for Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("label", &self.label())
            .field("status", &self.status())
            .finish()
    }
}
