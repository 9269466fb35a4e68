//! Mutation Gateway: create, update and delete requests.
//!
//! | Method   | Path             | Body                     |
//! |----------|------------------|--------------------------|
//! | `POST`   | `/contacts`      | the four fields, no id   |
//! | `PUT`    | `/contacts/{id}` | the four fields plus id  |
//! | `DELETE` | `/contacts/{id}` | —                        |
//!
//! The gateway is stateless between calls and never holds a contact list.
//! Callers learn about the resulting directory state only through
//! [`crate::sync`].

use roster_core::{Contact, ContactFields, ContactId};

use crate::{ApiClient, Result};

#[derive(Debug, Clone)]
pub struct MutationGateway {
  api: ApiClient,
}

impl MutationGateway {
  pub fn new(api: ApiClient) -> Self { Self { api } }

  /// `POST /contacts`. The server assigns the id; any echoed record in the
  /// response body is ignored.
  pub async fn create(&self, fields: &ContactFields) -> Result<()> {
    self
      .api
      .send(self.api.post("/contacts").json(fields), "POST /contacts")
      .await?;
    Ok(())
  }

  /// `PUT /contacts/{id}` with all four fields (full replace).
  pub async fn update(&self, contact: &Contact) -> Result<()> {
    let path = format!("/contacts/{}", contact.id);
    let what = format!("PUT {path}");
    self.api.send(self.api.put(&path).json(contact), &what).await?;
    Ok(())
  }

  /// `DELETE /contacts/{id}`. A missing id is reported by the server.
  pub async fn remove(&self, id: ContactId) -> Result<()> {
    let path = format!("/contacts/{id}");
    let what = format!("DELETE {path}");
    self.api.send(self.api.delete(&path), &what).await?;
    Ok(())
  }
}
