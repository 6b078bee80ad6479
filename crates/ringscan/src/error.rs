use crate::{
    checkpoint::StoreError, context::ContextError, session::SessionError,
    statement::SyntaxError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable classification.
/// Every fallible public operation in this crate returns it.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a metadata-origin not-found error for a table.
    pub(crate) fn table_not_found(keyspace: &str, table: &str) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Metadata,
            format!("could not find metadata for table: {keyspace}.{table}"),
        )
    }

    /// Construct a metadata-origin invariant violation.
    pub(crate) fn metadata_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Metadata,
            message.into(),
        )
    }

    /// Construct a scan-origin unsupported error.
    pub(crate) fn scan_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Scan, message.into())
    }

    /// Construct a scan-origin corruption error (undecodable row data).
    pub(crate) fn scan_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Scan, message.into())
    }

    /// Construct a serialize-origin internal error.
    pub(crate) fn serialize_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Serialize, message.into())
    }

    /// Construct a checkpoint-origin corruption error.
    pub(crate) fn checkpoint_corruption(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::Corruption,
            ErrorOrigin::Checkpoint,
            message.into(),
        )
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.class, ErrorClass::Cancelled)
    }

    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::Syntax(_)))
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Syntax(SyntaxError),

    #[error("{0}")]
    Store(StoreError),

    #[error("{0}")]
    Session(SessionError),
}

impl From<SyntaxError> for InternalError {
    fn from(err: SyntaxError) -> Self {
        Self {
            class: ErrorClass::Unsupported,
            origin: ErrorOrigin::Statement,
            message: format!("could not parse query: {err}"),
            detail: Some(ErrorDetail::Syntax(err)),
        }
    }
}

impl From<StoreError> for InternalError {
    fn from(err: StoreError) -> Self {
        let class = match &err {
            StoreError::Context(_) => ErrorClass::Cancelled,
            StoreError::Backend(_) => ErrorClass::Internal,
        };

        Self {
            class,
            origin: ErrorOrigin::Store,
            message: err.to_string(),
            detail: Some(ErrorDetail::Store(err)),
        }
    }
}

impl From<SessionError> for InternalError {
    fn from(err: SessionError) -> Self {
        let class = match &err {
            SessionError::Context(_) => ErrorClass::Cancelled,
            SessionError::Metadata(_) | SessionError::Execute(_) | SessionError::Fetch(_) => {
                ErrorClass::Internal
            }
        };
        let origin = match &err {
            SessionError::Metadata(_) => ErrorOrigin::Metadata,
            _ => ErrorOrigin::Session,
        };

        Self {
            class,
            origin,
            message: err.to_string(),
            detail: Some(ErrorDetail::Session(err)),
        }
    }
}

impl From<ContextError> for InternalError {
    fn from(err: ContextError) -> Self {
        Self::new(ErrorClass::Cancelled, ErrorOrigin::Scan, err.to_string())
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Corruption,
    NotFound,
    Internal,
    Unsupported,
    InvariantViolation,
    Cancelled,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Statement,
    Metadata,
    Session,
    Checkpoint,
    Store,
    Serialize,
    Scan,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Statement => "statement",
            Self::Metadata => "metadata",
            Self::Session => "session",
            Self::Checkpoint => "checkpoint",
            Self::Store => "store",
            Self::Serialize => "serialize",
            Self::Scan => "scan",
        };
        write!(f, "{label}")
    }
}
