use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger file not available: {}", .0.display())]
    StoreUnavailable(PathBuf),
    #[error("Failed to append to ledger: {0}")]
    WriteFailed(#[source] io::Error),
    #[error("Failed to read ledger: {0}")]
    ReadFailed(#[source] io::Error),
    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: RecordError },
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationError),
}

impl From<ValidationError> for LedgerError {
    fn from(error: ValidationError) -> Self {
        Self::ValidationFailed(error)
    }
}

/// Why a single CSV row could not be turned into an entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("unexpected header row")]
    UnexpectedHeader,
    #[error("invalid date-time '{0}'")]
    InvalidDateTime(String),
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("negative amount '{0}'")]
    NegativeAmount(String),
    #[error("unknown flow type '{0}'")]
    InvalidFlowType(String),
    #[error("empty name")]
    EmptyName,
    #[error("unreadable row: {0}")]
    Csv(String),
}

/// Form-level input problems, shown to the user and never sent to the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter an amount")]
    EmptyAmount,
    #[error("{0} is Not Valid Amount, Please Enter a Valid Number")]
    InvalidAmount(String),
    #[error("Amount has not been entered")]
    MissingAmount,
    #[error("Name must not be empty")]
    MissingName,
    #[error("Date has not been set")]
    MissingDate,
    #[error("Time has not been set")]
    MissingTime,
    #[error("Flow type has not been selected")]
    MissingFlowType,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the user data directory")]
    NoDataDir,
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
