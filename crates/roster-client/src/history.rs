//! History Reader: one contact and its audit log.
//!
//! Both reads go straight to the REST API and are independent of any push
//! subscription. They are not transactional with each other.

use roster_core::{Contact, ContactId, HistoryEntry};

use crate::{ApiClient, Result};

/// A contact's current record alongside its audit log, newest first as the
/// server ordered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactHistory {
  pub contact: Contact,
  pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct HistoryReader {
  api: ApiClient,
}

impl HistoryReader {
  pub fn new(api: ApiClient) -> Self { Self { api } }

  /// `GET /contacts/{id}`
  pub async fn get_contact(&self, id: ContactId) -> Result<Contact> {
    let path = format!("/contacts/{id}");
    let what = format!("GET {path}");
    self.api.send_json(self.api.get(&path), &what).await
  }

  /// `GET /history?contact_id={id}`
  ///
  /// Entries keep the order the server sent them in.
  pub async fn get_history(&self, id: ContactId) -> Result<Vec<HistoryEntry>> {
    let req = self.api.get("/history").query(&[("contact_id", id.0)]);
    let mut entries: Vec<HistoryEntry> = self.api.send_json(req, "GET /history").await?;
    for entry in &mut entries {
      entry.contact_id.get_or_insert(id);
    }
    Ok(entries)
  }

  /// Read the contact, then its history.
  ///
  /// History is only requested once the contact is known to exist. If the
  /// contact is deleted in between, the history call may 404; that case
  /// yields an empty log rather than an error.
  pub async fn load(&self, id: ContactId) -> Result<ContactHistory> {
    let contact = self.get_contact(id).await?;
    let entries = match self.get_history(id).await {
      Ok(entries) => entries,
      Err(e) if e.is_not_found() => {
        tracing::debug!(contact = %id, "contact vanished before history read");
        Vec::new()
      }
      Err(e) => return Err(e),
    };
    Ok(ContactHistory { contact, entries })
  }
}
