//! Error type for `roster-client`.

use reqwest::StatusCode;
use thiserror::Error;

/// Fallback text when the server gave no usable message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum Error {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The server answered with a non-success status.
  #[error("server responded {status}: {}", .message.as_deref().unwrap_or(UNKNOWN_ERROR))]
  Status {
    status:  StatusCode,
    message: Option<String>,
  },

  #[error("invalid url: {0:?}")]
  Url(String),

  #[error("websocket error: {0}")]
  WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl Error {
  /// Text suitable for a global error line or notice: the server-supplied
  /// message when there is one.
  pub fn user_message(&self) -> &str {
    match self {
      Self::Status { message: Some(m), .. } => m,
      _ => UNKNOWN_ERROR,
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
