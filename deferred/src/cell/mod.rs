//! The settle-once cell.
//!
//! This module defines the core abstraction of the crate: a slot that is
//! settled at most once and the protocol for reacting to that settlement.
//!
//! It includes:
//! - the lifecycle state (pending, fulfilled, rejected),
//! - the settlement capabilities handed to executors,
//! - the reaction queue drained at settlement,
//! - the resolution procedure behind `then`, which flattens returned cells,
//! - future and blocking adapters for observing the result.

mod core;
mod dispatch;
mod future;
mod reaction;
mod resolution;
mod settle;
mod state;

pub(crate) use resolution::adopt;

pub use self::core::Deferred;
pub use future::Settled;
pub use resolution::Resolution;
pub use settle::{Rejecter, Resolver};
pub use state::Status;
