//! Failure payloads.
//!
//! A rejected [`Deferred`](crate::Deferred) carries an opaque reason of the
//! caller's choosing. A panic raised by an executor or a handler only becomes
//! an ordinary rejection when the cell was built with a way to turn a
//! [`Panicked`] into that reason type, see
//! [`DeferredBuilder`](crate::DeferredBuilder).
//!
//! [`Reason`] is provided for callers that do not want to define their own
//! reason type.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// A panic captured while running an executor or a reaction handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("panicked: {message}")]
pub struct Panicked {
    message: String,
}

impl Panicked {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Builds a `Panicked` from the payload returned by `catch_unwind`.
    ///
    /// `panic!` payloads are either a `&'static str` or a `String`; anything
    /// else is reported without a message.
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => String::from("<non-string panic payload>"),
            },
        };

        Self { message }
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Panicked> for String {
    fn from(panicked: Panicked) -> Self {
        panicked.to_string()
    }
}

/// A general-purpose, cheaply cloneable failure payload.
#[derive(Debug, Clone, Error)]
pub enum Reason {
    /// A plain message.
    #[error("{0}")]
    Message(Arc<str>),

    /// An arbitrary error value.
    #[error(transparent)]
    Error(Arc<dyn StdError + Send + Sync>),

    /// A panic converted into a rejection.
    #[error(transparent)]
    Panicked(#[from] Panicked),
}

impl Reason {
    /// Wraps any error value.
    pub fn error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Reason::Error(Arc::new(error))
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Reason::Panicked(_))
    }
}

impl From<&str> for Reason {
    fn from(message: &str) -> Self {
        Reason::Message(Arc::from(message))
    }
}

impl From<String> for Reason {
    fn from(message: String) -> Self {
        Reason::Message(Arc::from(message))
    }
}

impl PartialEq for Reason {
    /// Messages and panics compare by content, wrapped errors by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Reason::Message(a), Reason::Message(b)) => a == b,
            (Reason::Error(a), Reason::Error(b)) => Arc::ptr_eq(a, b),
            (Reason::Panicked(a), Reason::Panicked(b)) => a == b,
            _ => false,
        }
    }
}
