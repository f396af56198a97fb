//! Error types for `estate-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown user status: {0:?}")]
  UnknownUserStatus(String),

  #[error("unknown property status: {0:?}")]
  UnknownPropertyStatus(String),

  #[error("invalid date for {field}: {value:?}")]
  InvalidDate { field: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
