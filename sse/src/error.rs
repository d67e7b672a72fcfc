//! Error types for the `sse` crate.
//!
//! Follows the same pattern as the other layers: a root `Error` struct holding an
//! `error_kind` and an optional `source` for error chaining. Delivery outcomes are
//! deliberately not errors, see `connection::Delivery`.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the sse crate.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in the sse crate.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// A client id was empty or contained control characters.
    InvalidClientId,
    /// The listener could not be bound or the server stopped abnormally.
    Transport,
}

impl Error {
    pub fn invalid_client_id() -> Self {
        Self {
            source: None,
            error_kind: ErrorKind::InvalidClientId,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.error_kind {
            ErrorKind::InvalidClientId => write!(f, "SSE Error: invalid client id"),
            ErrorKind::Transport => match &self.source {
                Some(source) => write!(f, "SSE Error: transport failure: {source}"),
                None => write!(f, "SSE Error: transport failure"),
            },
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Transport,
        }
    }
}
