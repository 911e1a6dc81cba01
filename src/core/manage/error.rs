//! Tagged management errors.
//!
//! Callers branch on [`ManageError::kind`]; an unimplemented operation is a
//! capability mismatch, not an outage.

use std::fmt;

use thiserror::Error;

use super::Operation;

/// Outcome kind of a failed management call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Unimplemented,
    AlreadyExists,
    InvalidArgument,
    Conflict,
    Unavailable,
    DeadlineExceeded,
}

/// Operation-specific failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainErrorKind {
    AlreadyExists,
    InvalidArgument,
    Conflict,
    Unavailable,
    DeadlineExceeded,
}

impl fmt::Display for DomainErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DomainErrorKind::AlreadyExists => "already exists",
            DomainErrorKind::InvalidArgument => "invalid argument",
            DomainErrorKind::Conflict => "conflict",
            DomainErrorKind::Unavailable => "unavailable",
            DomainErrorKind::DeadlineExceeded => "deadline exceeded",
        };
        f.write_str(s)
    }
}

/// A failure reported by the managed deployment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DomainError {
    pub kind: DomainErrorKind,
    pub message: String,
}

impl DomainError {
    pub fn new(kind: DomainErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            DomainErrorKind::Unavailable | DomainErrorKind::DeadlineExceeded
        )
    }
}

/// Error returned by every management operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("method {} not implemented", .0.name())]
    Unimplemented(Operation),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ManageError {
    pub fn already_exists(message: impl Into<String>) -> Self {
        DomainError::new(DomainErrorKind::AlreadyExists, message).into()
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DomainError::new(DomainErrorKind::InvalidArgument, message).into()
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::new(DomainErrorKind::Conflict, message).into()
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        DomainError::new(DomainErrorKind::Unavailable, message).into()
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ManageError::NotFound(_) => ErrorKind::NotFound,
            ManageError::Unimplemented(_) => ErrorKind::Unimplemented,
            ManageError::Domain(e) => match e.kind {
                DomainErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
                DomainErrorKind::InvalidArgument => ErrorKind::InvalidArgument,
                DomainErrorKind::Conflict => ErrorKind::Conflict,
                DomainErrorKind::Unavailable => ErrorKind::Unavailable,
                DomainErrorKind::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            },
        }
    }

    pub fn is_unimplemented(&self) -> bool {
        matches!(self, ManageError::Unimplemented(_))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ManageError::Domain(e) => e.is_retryable(),
            _ => false,
        }
    }
}
