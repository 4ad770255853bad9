//! Error types for `admissions-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("student not found: {0}")]
  StudentNotFound(i64),

  #[error("counselor not found: {0}")]
  CounselorNotFound(i64),

  #[error("acting user not found: {0}")]
  ActingUserNotFound(i64),

  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure category, used by outer layers to pick a response without
/// knowing which backend produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  NotFound,
  Conflict,
  Internal,
}

impl Error {
  pub fn class(&self) -> ErrorClass {
    match self {
      Self::StudentNotFound(_) | Self::CounselorNotFound(_) | Self::ActingUserNotFound(_) => {
        ErrorClass::NotFound
      }
      Self::UnknownVariant { .. } => ErrorClass::Internal,
    }
  }
}

/// Implemented by store error types so the HTTP layer can classify them.
pub trait Classify {
  fn class(&self) -> ErrorClass;
}

impl Classify for Error {
  fn class(&self) -> ErrorClass { Error::class(self) }
}

/// Parse a stored enum discriminant, naming the enum in the error.
pub fn parse_variant<T: std::str::FromStr>(kind: &'static str, value: &str) -> Result<T> {
  value.parse().map_err(|_| Error::UnknownVariant {
    kind,
    value: value.to_owned(),
  })
}
