//! Error types for geodata.

use thiserror::Error;

/// Error type for geodata operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A typed read ran past the end of the source or the source failed
    #[error("reading {field} at offset {offset}: {source}")]
    Read {
        field: &'static str,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// A field was read but its content is invalid
    #[error("invalid {field} at offset {offset}: {reason}")]
    Format {
        field: &'static str,
        offset: u64,
        reason: String,
    },

    /// Failure while decoding one of the database tables
    #[error("reading {table}{}: {source}", fmt_row(.row))]
    Load {
        table: &'static str,
        row: Option<usize>,
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid IPv4 address text
    #[error("invalid IP address: {0}")]
    InvalidIpAddress(String),

    /// The query matched no record
    #[error("not found")]
    NotFound,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for geodata operations.
pub type Result<T> = std::result::Result<T, Error>;

fn fmt_row(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!(" row {}", row),
        None => String::new(),
    }
}

impl Error {
    /// Wrap an error with the table it occurred in.
    pub(crate) fn in_table(self, table: &'static str) -> Self {
        Error::Load {
            table,
            row: None,
            source: Box::new(self),
        }
    }

    /// Wrap an error with the table and row it occurred in.
    pub(crate) fn in_row(self, table: &'static str, row: usize) -> Self {
        Error::Load {
            table,
            row: Some(row),
            source: Box::new(self),
        }
    }

    /// Whether this error is the "no matching record" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    /// Innermost field name for decoding errors, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::Read { field, .. } | Error::Format { field, .. } => Some(field),
            Error::Load { source, .. } => source.field(),
            _ => None,
        }
    }
}
