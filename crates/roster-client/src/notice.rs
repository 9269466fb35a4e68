//! Transient user notifications for request outcomes.

use crate::{Error, Result};

/// Which mutation produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Create,
  Update,
  Delete,
}

impl MutationKind {
  fn success_message(self) -> &'static str {
    match self {
      Self::Create => "Contact added successfully",
      Self::Update => "Contact updated successfully",
      Self::Delete => "Contact deleted successfully",
    }
  }

  fn failure_message(self, err: &Error) -> String {
    match self {
      Self::Delete => format!("Error deleting contact: {}", err.user_message()),
      Self::Create | Self::Update => err.user_message().to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Success,
  Error,
}

/// A one-line toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Success, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Error, message: message.into() }
  }

  /// The notice to raise once a mutation settles.
  pub fn for_outcome(kind: MutationKind, outcome: &Result<()>) -> Self {
    match outcome {
      Ok(()) => Self::success(kind.success_message()),
      Err(e) => Self::error(kind.failure_message(e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use reqwest::StatusCode;

  use super::*;

  fn rejected(message: Option<&str>) -> Error {
    Error::Status {
      status:  StatusCode::BAD_REQUEST,
      message: message.map(Into::into),
    }
  }

  #[test]
  fn success_messages() {
    assert_eq!(
      Notice::for_outcome(MutationKind::Create, &Ok(())),
      Notice::success("Contact added successfully")
    );
    assert_eq!(
      Notice::for_outcome(MutationKind::Update, &Ok(())).message,
      "Contact updated successfully"
    );
  }

  #[test]
  fn failure_prefers_server_message() {
    let outcome = Err(rejected(Some("Oops! Email already exists")));
    assert_eq!(
      Notice::for_outcome(MutationKind::Create, &outcome),
      Notice::error("Oops! Email already exists")
    );
  }

  #[test]
  fn failure_without_message_is_unknown() {
    let outcome = Err(rejected(None));
    assert_eq!(Notice::for_outcome(MutationKind::Update, &outcome).message, "Unknown error");
    assert_eq!(
      Notice::for_outcome(MutationKind::Delete, &outcome).message,
      "Error deleting contact: Unknown error"
    );
  }
}
