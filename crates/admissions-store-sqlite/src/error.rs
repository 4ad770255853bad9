//! Error type for `admissions-store-sqlite`.

use admissions_core::{ErrorClass, error::Classify};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] admissions_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// A unique or foreign-key constraint rejected the write.
  #[error("constraint violation: {0}")]
  Constraint(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    match e {
      rusqlite::Error::SqliteFailure(failure, message)
        if failure.code == ErrorCode::ConstraintViolation =>
      {
        Self::Constraint(message.unwrap_or_else(|| failure.to_string()))
      }
      other => Self::Database(tokio_rusqlite::Error::Rusqlite(other)),
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Rusqlite(inner) => inner.into(),
      other => Self::Database(other),
    }
  }
}

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Self::Core(e) => e.class(),
      Self::Constraint(_) => ErrorClass::Conflict,
      Self::Database(_) | Self::DateParse(_) => ErrorClass::Internal,
    }
  }
}
