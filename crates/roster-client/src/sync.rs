//! Directory Sync Channel: live directory replication over a push
//! subscription.
//!
//! A subscription moves through
//!
//! ```text
//! Idle → Connecting → Open → Receiving* → Closed
//!            └────────┴──────────┴──────→ Error
//! ```
//!
//! Every inbound message is a complete directory snapshot. It replaces the
//! held snapshot wholesale; nothing is ever merged. There are no sequence
//! numbers on the wire, so delivery order is the only ordering: the last
//! snapshot to arrive wins. That is sound only because the server is the
//! single producer and always sends total state.
//!
//! Each subscription runs in its own tokio task, which is the only writer
//! of a [`watch`] cell. Readers take cheap clones of the latest view and
//! never write. `Closed` and `Error` are terminal for a subscription; the
//! last snapshot stays readable (and stale) until the consumer opens a new
//! one. Nothing reconnects automatically.

use std::{future::Future, sync::Arc};

use futures::{StreamExt, future, stream::BoxStream};
use roster_core::Contact;
use tokio::{sync::watch, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::Instrument as _;
use uuid::Uuid;

use crate::{ClientConfig, Result};

// ─── State ────────────────────────────────────────────────────────────────────

/// Lifecycle of one subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelState {
  /// No subscription exists.
  #[default]
  Idle,
  /// Handshake in flight; no snapshot yet.
  Connecting,
  /// Established, nothing received yet.
  Open,
  /// At least one snapshot has arrived on this subscription.
  Receiving,
  /// Ended by the server, the network, or the consumer.
  Closed,
  /// Transport failure. Terminal.
  Error(String),
}

impl ChannelState {
  /// Whether further snapshots may still arrive.
  pub fn is_live(&self) -> bool {
    matches!(self, Self::Connecting | Self::Open | Self::Receiving)
  }

  pub fn label(&self) -> &str {
    match self {
      Self::Idle => "idle",
      Self::Connecting => "connecting",
      Self::Open => "open",
      Self::Receiving => "live",
      Self::Closed => "closed",
      Self::Error(_) => "error",
    }
  }
}

/// What a consumer renders: the latest snapshot and the channel state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryView {
  pub contacts:  Arc<[Contact]>,
  pub state:     ChannelState,
  /// Snapshots accepted on this subscription. Local arrival count only.
  pub snapshots: u64,
}

impl Default for DirectoryView {
  fn default() -> Self {
    Self {
      contacts:  Arc::from(Vec::new()),
      state:     ChannelState::Idle,
      snapshots: 0,
    }
  }
}

impl DirectoryView {
  /// True until the first snapshot of a live subscription lands.
  pub fn is_loading(&self) -> bool { self.state.is_live() && self.snapshots == 0 }
}

// ─── Transport seam ───────────────────────────────────────────────────────────

/// One inbound message on the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
  Text(String),
  Close,
}

pub type FrameStream = BoxStream<'static, Result<Frame>>;

/// A receive-only push transport.
///
/// `connect` performs the handshake; the returned stream yields frames in
/// delivery order and ends when the connection does.
pub trait PushTransport: Send + Sync + 'static {
  fn connect(&self) -> impl Future<Output = Result<FrameStream>> + Send + '_;
}

/// WebSocket transport for the `/contacts` push endpoint.
#[derive(Debug, Clone)]
pub struct WsTransport {
  url: String,
}

impl WsTransport {
  pub fn new(url: impl Into<String>) -> Self { Self { url: url.into() } }

  pub fn from_config(config: &ClientConfig) -> Result<Self> {
    Ok(Self::new(config.push_endpoint()?))
  }

  pub fn url(&self) -> &str { &self.url }
}

impl PushTransport for WsTransport {
  fn connect(&self) -> impl Future<Output = Result<FrameStream>> + Send + '_ {
    async move {
      let (socket, _response) = connect_async(self.url.as_str()).await?;
      Ok(socket.filter_map(|msg| future::ready(to_frame(msg))).boxed())
    }
  }
}

/// Control traffic is dropped; pongs are answered by the library itself.
fn to_frame(
  msg: Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<Frame>> {
  match msg {
    Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.to_string()))),
    Ok(Message::Binary(bytes)) => {
      Some(Ok(Frame::Text(String::from_utf8_lossy(&bytes).into_owned())))
    }
    Ok(Message::Close(_)) => Some(Ok(Frame::Close)),
    Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
    Err(e) => Some(Err(e.into())),
  }
}

// ─── Subscriptions ────────────────────────────────────────────────────────────

/// Opens push subscriptions over a transport.
#[derive(Debug, Clone)]
pub struct DirectorySync<T> {
  transport: T,
}

impl<T: PushTransport + Clone> DirectorySync<T> {
  pub fn new(transport: T) -> Self { Self { transport } }

  /// Start one subscription. Must be called inside a tokio runtime.
  ///
  /// The returned handle must be closed (or dropped) when its view goes
  /// away; it is never shared between views.
  pub fn open(&self) -> SubscriptionHandle {
    let session_id = Uuid::new_v4();
    let (tx, rx) = watch::channel(DirectoryView {
      state: ChannelState::Connecting,
      ..DirectoryView::default()
    });
    let writer = Arc::new(tx);

    let span = tracing::info_span!("directory_sync", session = %session_id);
    let task = tokio::spawn(
      run_session(self.transport.clone(), Arc::clone(&writer)).instrument(span),
    );

    SubscriptionHandle { session_id, view: rx, writer, task: Some(task) }
  }
}

/// Scoped ownership of one live subscription.
///
/// Dropping the handle aborts the subscription task; [`close`](Self::close)
/// additionally waits for the task to finish, so no state is written after
/// it returns.
#[derive(Debug)]
pub struct SubscriptionHandle {
  session_id: Uuid,
  view:       watch::Receiver<DirectoryView>,
  writer:     Arc<watch::Sender<DirectoryView>>,
  task:       Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
  pub fn session_id(&self) -> Uuid { self.session_id }

  /// Synchronous read of the latest view.
  pub fn current(&self) -> DirectoryView { self.view.borrow().clone() }

  /// The latest snapshot and the channel state.
  pub fn current_snapshot(&self) -> (Arc<[Contact]>, ChannelState) {
    let view = self.view.borrow();
    (Arc::clone(&view.contacts), view.state.clone())
  }

  /// An extra read-only observer of this subscription.
  pub fn subscribe(&self) -> watch::Receiver<DirectoryView> { self.view.clone() }

  /// Wait until the view satisfies `pred` and return it.
  ///
  /// Returns `None` once the channel has ended (closed or failed) in a
  /// state that does not satisfy `pred`, since nothing will change after.
  pub async fn wait_for(
    &mut self,
    mut pred: impl FnMut(&DirectoryView) -> bool,
  ) -> Option<DirectoryView> {
    let view = self
      .view
      .wait_for(|v| pred(v) || !v.state.is_live())
      .await
      .ok()?
      .clone();
    pred(&view).then_some(view)
  }

  /// Tear the subscription down and return the final view.
  pub async fn close(mut self) -> DirectoryView {
    if let Some(task) = self.task.take() {
      task.abort();
      // Cancellation is the expected outcome here.
      let _ = task.await;
    }
    self.writer.send_modify(|view| {
      if view.state.is_live() {
        view.state = ChannelState::Closed;
      }
    });
    tracing::info!(session = %self.session_id, "subscription closed");
    self.current()
  }
}

impl Drop for SubscriptionHandle {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

fn set_state(writer: &watch::Sender<DirectoryView>, state: ChannelState) {
  writer.send_modify(|view| view.state = state);
}

async fn run_session<T: PushTransport>(
  transport: T,
  writer: Arc<watch::Sender<DirectoryView>>,
) {
  let mut frames = match transport.connect().await {
    Ok(frames) => frames,
    Err(e) => {
      tracing::warn!(error = %e, "push channel handshake failed");
      set_state(&writer, ChannelState::Error(e.to_string()));
      return;
    }
  };
  tracing::info!("push channel open");
  set_state(&writer, ChannelState::Open);

  while let Some(frame) = frames.next().await {
    match frame {
      Ok(Frame::Text(payload)) => match serde_json::from_str::<Vec<Contact>>(&payload) {
        Ok(contacts) => {
          tracing::debug!(contacts = contacts.len(), "snapshot received");
          writer.send_modify(|view| {
            view.contacts = Arc::from(contacts);
            view.state = ChannelState::Receiving;
            view.snapshots += 1;
          });
        }
        Err(e) => tracing::warn!(error = %e, "discarding malformed snapshot"),
      },
      Ok(Frame::Close) => break,
      Err(e) => {
        tracing::warn!(error = %e, "push channel failed");
        set_state(&writer, ChannelState::Error(e.to_string()));
        return;
      }
    }
  }

  tracing::info!("push channel closed");
  set_state(&writer, ChannelState::Closed);
}
