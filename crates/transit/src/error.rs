//! Error types.

use transit_pack::{JsonError, MsgPackError};

use crate::value::Value;

/// Configuration errors found while encoding. Nothing written before the
/// error is usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("no write handler produced a tag for {type_name}")]
    MissingTag { type_name: &'static str },
    #[error("{type_name} has tag `{tag}` but no string representation")]
    NotStringable { tag: String, type_name: &'static str },
    #[error("{type_name} (tag `{tag}`) cannot be written as a map key")]
    InvalidMapKey { tag: String, type_name: &'static str },
    #[error("tag `{tag}` needs a {expected} representation")]
    UnexpectedRep { tag: String, expected: &'static str },
}

/// Returned by a read handler that cannot turn a representation into a
/// value. Carries the representation it was given.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepError {
    #[error("expected {expected}, got {found}")]
    Expected { expected: &'static str, found: Value },
    #[error("{reason}: {found}")]
    Invalid { reason: String, found: Value },
}

impl RepError {
    pub fn expected(expected: &'static str, found: Value) -> Self {
        RepError::Expected { expected, found }
    }

    pub fn invalid(reason: impl Into<String>, found: Value) -> Self {
        RepError::Invalid {
            reason: reason.into(),
            found,
        }
    }

    /// The offending representation.
    pub fn found(&self) -> &Value {
        match self {
            RepError::Expected { found, .. } | RepError::Invalid { found, .. } => found,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("cannot read `{tag}` value: {source}")]
    Handler { tag: String, source: RepError },
    #[error("map array with {0} entries after the marker is not a sequence of pairs")]
    OddMapArray(usize),
}

/// Stream-level error of [`Writer`](crate::Writer) and
/// [`Reader`](crate::Reader).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error(transparent)]
    MsgPack(#[from] MsgPackError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
