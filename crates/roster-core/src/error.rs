//! Error types for `roster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unrecognised timestamp: {0:?}")]
  Timestamp(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
