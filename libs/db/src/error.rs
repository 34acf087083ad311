//! Error types for cellmap-db.
//!
//! Errors fall into four groups:
//!
//! - **Configuration**: raised while building an entity descriptor or loading
//!   configuration. A type that fails here stays unusable until fixed; failed
//!   builds are never cached.
//! - **Ambiguous input**: raised per decode call when a row contradicts the
//!   descriptor (two cells for one scalar, several cells for a scalar result).
//! - **Merge**: raised per encode call when a `Put` cannot be merged.
//! - **Store**: I/O failures from a cell store, passed through uninterpreted.
//!
//! Unknown families and qualifiers are not errors; the decoder skips them.

use thiserror::Error;

use crate::field::FieldShape;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Row-key attribute declared with a non-scalar shape
    #[error("unsupported row-key type for {entity}.{attribute}: {shape} (row keys are always scalar)")]
    UnsupportedRowKey {
        entity: &'static str,
        attribute: String,
        shape: FieldShape,
    },

    /// Attribute whose type cannot be mapped onto the column space
    #[error("unsupported attribute type for {entity}.{attribute}: {reason}")]
    UnsupportedAttribute {
        entity: &'static str,
        attribute: String,
        reason: String,
    },

    /// Two attributes resolve to the same stored column
    #[error("duplicate column '{column}' in {entity} (attributes '{first}' and '{second}')")]
    DuplicateColumn {
        entity: &'static str,
        column: String,
        first: String,
        second: String,
    },

    /// Naming policy name not recognised
    #[error("unknown naming policy: {0}")]
    UnknownNamingPolicy(String),

    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// More than one cell for a Scalar attribute within one row
    #[error("ambiguous scalar for {entity}.{attribute}: more than one cell at column '{column}'")]
    AmbiguousScalar {
        entity: &'static str,
        attribute: String,
        column: String,
    },

    /// More than one cell when decoding a non-entity target
    #[error("ambiguous scalar result for {type_name}: expected at most one cell, got {cells}")]
    AmbiguousResult { type_name: &'static str, cells: usize },

    /// Cells from more than one row handed to a single-row decode
    #[error("cell stream for row '{expected}' contains a cell for row '{found}'")]
    MixedRows { expected: String, found: String },

    /// Put merge rejected
    #[error("merge error: {0}")]
    Merge(String),

    /// A Put was requested for a record without a row key
    #[error("{entity} has no row key to build a mutation from")]
    MissingRowKey { entity: &'static str },

    /// Cell bytes could not be converted to the declared value type
    #[error("cannot decode {type_name} from cell value: {reason}")]
    Codec {
        type_name: &'static str,
        reason: String,
    },

    /// Row, family or qualifier the store cannot represent
    #[error("invalid column: {0}")]
    InvalidColumn(String),

    /// Failure reported by the underlying store
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Create a codec error
    pub fn codec(type_name: &'static str, reason: impl ToString) -> Self {
        Error::Codec {
            type_name,
            reason: reason.to_string(),
        }
    }

    /// Create an I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    /// Create a merge error
    pub fn merge(msg: impl Into<String>) -> Self {
        Error::Merge(msg.into())
    }

    /// Errors raised while building a descriptor or loading configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedRowKey { .. }
                | Error::UnsupportedAttribute { .. }
                | Error::DuplicateColumn { .. }
                | Error::UnknownNamingPolicy(_)
                | Error::Config(_)
        )
    }

    /// Errors caused by a row that contradicts the descriptor.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Error::AmbiguousScalar { .. } | Error::AmbiguousResult { .. } | Error::MixedRows { .. }
        )
    }
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Io(e.into_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
