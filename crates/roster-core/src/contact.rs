//! Contact: the unit of the shared directory.
//!
//! The server owns identity: a [`Contact`] always carries a server-assigned
//! [`ContactId`]. Records that have not been accepted yet are plain
//! [`ContactFields`] and have no id at all.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Server-assigned contact identifier. Immutable once assigned.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContactId(pub i64);

impl fmt::Display for ContactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl From<i64> for ContactId {
  fn from(value: i64) -> Self { Self(value) }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// The mutable attributes of a contact, in form order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
  FirstName,
  LastName,
  Email,
  Phone,
}

impl Field {
  pub const ALL: [Self; 4] = [Self::FirstName, Self::LastName, Self::Email, Self::Phone];

  /// The next field in form order, wrapping around.
  pub fn next(self) -> Self { Self::ALL[(self as usize + 1) % Self::ALL.len()] }

  pub fn prev(self) -> Self {
    Self::ALL[(self as usize + Self::ALL.len() - 1) % Self::ALL.len()]
  }

  /// Human-readable label for form inputs.
  pub fn label(self) -> &'static str {
    match self {
      Self::FirstName => "First Name",
      Self::LastName => "Last Name",
      Self::Email => "Email",
      Self::Phone => "Phone",
    }
  }
}

/// A candidate contact record: the create body, and the editable part of an
/// existing [`Contact`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      String,
}

impl ContactFields {
  pub fn get(&self, field: Field) -> &str {
    match field {
      Field::FirstName => &self.first_name,
      Field::LastName => &self.last_name,
      Field::Email => &self.email,
      Field::Phone => &self.phone,
    }
  }

  pub fn get_mut(&mut self, field: Field) -> &mut String {
    match field {
      Field::FirstName => &mut self.first_name,
      Field::LastName => &mut self.last_name,
      Field::Email => &mut self.email,
      Field::Phone => &mut self.phone,
    }
  }

  /// `"first last"`, as shown in lists and headings.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A directory entry as the server knows it.
///
/// On the wire the id sits alongside the four fields in one flat object.
/// Extra keys the server may add (e.g. `created_at`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub id:     ContactId,
  #[serde(flatten)]
  pub fields: ContactFields,
}

impl Contact {
  pub fn new(id: impl Into<ContactId>, fields: ContactFields) -> Self {
    Self { id: id.into(), fields }
  }
}
