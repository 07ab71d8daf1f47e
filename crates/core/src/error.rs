//! Error types for the tickflow system.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tickflow system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing data).
    #[error("Data error: {0}")]
    Data(String),

    /// Index outside of `[0, size)` on a ticker or indicator.
    #[error("Index {index} is out of range (size {size})")]
    OutOfRange { index: usize, size: usize },

    /// A tick whose time slot does not follow the last appended one.
    #[error("Tick at {next} does not follow the last tick at {last}")]
    OutOfOrder {
        last: DateTime<Utc>,
        next: DateTime<Utc>,
    },

    /// An execution older than the slot currently being built.
    #[error("Execution at {date} is older than the open slot starting at {slot}")]
    StaleExecution {
        date: DateTime<Utc>,
        slot: DateTime<Utc>,
    },

    /// Decimal division with a zero divisor.
    #[error("Division by zero")]
    DivisionByZero,

    /// Indicators bound to different tickers were combined.
    #[error("Topology error: {0}")]
    Topology(String),

    /// Numeric parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A lock was poisoned by a panicking writer.
    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a topology error.
    pub fn topology(msg: impl Into<String>) -> Self {
        Error::Topology(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create an out of range error.
    pub fn out_of_range(index: usize, size: usize) -> Self {
        Error::OutOfRange { index, size }
    }

    /// Whether this is an arithmetic failure rather than a data/range one.
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Error::DivisionByZero)
    }
}
