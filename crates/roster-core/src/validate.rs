//! Field validation run before every submission.
//!
//! The rules are shape checks, not format validators: the email pattern is a
//! minimal `local@domain.tld` shape, and the phone pattern only needs to match
//! a North-American number at the start of the input.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use crate::contact::{ContactFields, Field};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

// Unanchored at the end: trailing text after a valid number is accepted.
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:\+1)?\s?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}")
    .expect("phone pattern compiles")
});

/// Per-field error messages. Empty iff the record may be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn get(&self, field: Field) -> Option<&'static str> {
    self.0.get(&field).copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
    self.0.iter().map(|(f, m)| (*f, *m))
  }
}

pub fn is_valid_email(email: &str) -> bool { EMAIL.is_match(email) }

pub fn is_valid_phone(phone: &str) -> bool { PHONE.is_match(phone) }

/// Check `fields` against the submission rules.
pub fn validate(fields: &ContactFields) -> FieldErrors {
  let mut errors = BTreeMap::new();

  if fields.first_name.is_empty() {
    errors.insert(Field::FirstName, "First name is required");
  }
  if fields.last_name.is_empty() {
    errors.insert(Field::LastName, "Last name is required");
  }

  if fields.email.is_empty() {
    errors.insert(Field::Email, "Email is required");
  } else if !is_valid_email(&fields.email) {
    errors.insert(Field::Email, "Please enter a valid email address");
  }

  if fields.phone.is_empty() {
    errors.insert(Field::Phone, "Phone number is required");
  } else if !is_valid_phone(&fields.phone) {
    errors.insert(Field::Phone, "Please enter a valid phone number");
  }

  FieldErrors(errors)
}
