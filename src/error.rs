use std::fmt;
use std::num::ParseFloatError;

use thiserror::Error;

/// Crate error type for table operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The initial connection to the database could not be established.
    #[error("cannot establish connection to database {database}: {message}")]
    Connection { database: String, message: String },
    /// A prepared statement failed to compile against the live schema.
    #[error("preparing {name} ({statement}) failed: {message}")]
    Prepare {
        name: String,
        statement: String,
        message: String,
    },
    /// An ad-hoc query, prepared execution or COPY step failed in the store.
    #[error("{statement} failed: {message}")]
    Query { statement: String, message: String },
    /// The operation is not allowed in the current connection state.
    #[error("{operation} failed: {violation}")]
    ProtocolState {
        operation: String,
        violation: ProtocolViolation,
    },
    /// A value returned by the store could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl DriverError {
    pub(crate) fn protocol(operation: impl Into<String>, violation: ProtocolViolation) -> Self {
        Self::ProtocolState {
            operation: operation.into(),
            violation,
        }
    }

    pub(crate) fn query(statement: impl Into<String>, diagnostic: StoreDiagnostic) -> Self {
        Self::Query {
            statement: statement.into(),
            message: diagnostic.0,
        }
    }
}

/// Why an operation was refused before anything was sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Only copy data and the end of the copy are allowed while COPY is open.
    InCopyMode,
    /// Copy data or the end of the copy was sent while no COPY is open.
    NotInCopyMode,
    /// A copy line has to end with `\n`.
    MissingLineTerminator,
    /// `intermediate_commit` needs an open `BEGIN` block.
    NoOpenTransaction,
    /// The named prepared statement is not available for this table type.
    StatementNotPrepared(&'static str),
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InCopyMode => write!(f, "you are in COPY mode"),
            Self::NotInCopyMode => write!(f, "you are not in COPY mode"),
            Self::MissingLineTerminator => write!(f, "line does not end with \\n"),
            Self::NoOpenTransaction => write!(f, "no transaction has been opened with BEGIN"),
            Self::StatementNotPrepared(name) => {
                write!(f, "prepared statement {name} does not exist for this table")
            }
        }
    }
}

/// Geometry payload decoding failures. An absent row is not one of them.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Wraps errors returned by the `hex` crate.
    #[error("invalid hex geometry: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Wraps errors returned by the `wkb` crate.
    #[error("invalid WKB geometry: {0}")]
    Wkb(#[from] wkb::error::WkbError),
    /// A coordinate column did not hold a number.
    #[error("invalid coordinate value {value:?}: {source}")]
    Number {
        value: String,
        source: ParseFloatError,
    },
    /// The row has fewer columns than the read expects.
    #[error("result row has {got} columns, expected {expected}")]
    MissingField { expected: usize, got: usize },
}

/// Diagnostic text reported by the store for a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreDiagnostic(pub String);

impl From<tokio_postgres::Error> for StoreDiagnostic {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db_error) => Self(format!("{}: {}", db_error.severity(), db_error.message())),
            None => Self(err.to_string()),
        }
    }
}

impl From<&str> for StoreDiagnostic {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
