//! Error type for `estate-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored value falls outside a closed enum, or a filter did not parse.
  #[error("core error: {0}")]
  Core(#[from] estate_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("email already registered: {0}")]
  DuplicateEmail(String),

  #[error("payment already recorded: {0}")]
  DuplicatePayment(String),

  /// A sold property references a seller that no longer exists.
  #[error("sold property references missing seller {0}")]
  DanglingSeller(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
