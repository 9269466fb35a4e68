//! Network side of the roster client.
//!
//! Three independent pieces sit on top of a shared [`ApiClient`]:
//!
//! - [`MutationGateway`] issues create/update/delete requests and reports
//!   only success or failure.
//! - [`HistoryReader`] fetches one contact and its audit log.
//! - [`DirectorySync`] owns push subscriptions. Every subscription receives
//!   full directory snapshots from the server and is the only way the
//!   displayed list ever changes.
//!
//! A successful mutation never edits a local list. Its effect becomes
//! visible when the next snapshot lands, which may happen before or after
//! the mutation response arrives.

pub mod client;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod history;
pub mod notice;
pub mod sync;

pub use client::{ApiClient, ClientConfig};
pub use error::{Error, Result};
pub use gate::{SubmitGate, SubmitPermit};
pub use gateway::MutationGateway;
pub use history::{ContactHistory, HistoryReader};
pub use notice::{MutationKind, Notice, NoticeLevel};
pub use sync::{
  ChannelState, DirectorySync, DirectoryView, Frame, FrameStream, PushTransport,
  SubscriptionHandle, WsTransport,
};
