//! Failure value carried by the terminal error signal.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Cloneable container for a stream failure.
///
/// Carries a human-readable message plus an optional source error. Clones are
/// cheap and share the underlying source, so the same failure can be handed
/// to several observers without copying the error chain.
#[derive(Debug, Clone)]
pub struct Failure {
    message: Arc<str>,
    source: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl Failure {
    /// Creates a failure from a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into().into(),
            source: None,
        }
    }

    /// Creates a failure wrapping a source error; the message is the error's
    /// `Display` rendering.
    pub fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: error.to_string().into(),
            source: Some(Arc::new(error)),
        }
    }

    /// Creates a failure from a panic payload, extracting `&str` and `String`
    /// payloads as the message.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::new(panic_description(payload))
    }

    /// The human-readable description of this failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Failure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Best-effort extraction of a message from a panic payload.
pub(crate) fn panic_description(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "subscriber callback panicked"
    }
}
