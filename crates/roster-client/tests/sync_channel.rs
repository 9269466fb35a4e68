//! Directory Sync Channel driven by a scripted transport.
//!
//! The script is an unbounded channel of frames, so each test controls
//! exactly when snapshots arrive relative to everything else.

use std::{
  future::Future,
  sync::{Arc, Mutex},
  time::Duration,
};

use futures::{
  StreamExt,
  channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded},
};
use roster_client::{
  ApiClient, ChannelState, ClientConfig, DirectorySync, DirectoryView, Error, Frame,
  FrameStream, MutationGateway, PushTransport, Result, SubscriptionHandle,
};
use roster_core::{Contact, ContactFields, ContactId};
use serde_json::json;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Scripted {
  frames: Arc<Mutex<Option<UnboundedReceiver<Result<Frame>>>>>,
}

impl PushTransport for Scripted {
  fn connect(&self) -> impl Future<Output = Result<FrameStream>> + Send + '_ {
    let frames = self.frames.lock().unwrap().take();
    async move {
      match frames {
        Some(rx) => Ok(rx.boxed()),
        None => Err(Error::WebSocket(tungstenite::Error::AlreadyClosed)),
      }
    }
  }
}

#[derive(Clone)]
struct Refused;

impl PushTransport for Refused {
  fn connect(&self) -> impl Future<Output = Result<FrameStream>> + Send + '_ {
    async { Err(Error::WebSocket(tungstenite::Error::ConnectionClosed)) }
  }
}

fn scripted() -> (DirectorySync<Scripted>, UnboundedSender<Result<Frame>>) {
  let (tx, rx) = unbounded();
  let transport = Scripted { frames: Arc::new(Mutex::new(Some(rx))) };
  (DirectorySync::new(transport), tx)
}

fn contact(id: i64, first: &str) -> Contact {
  Contact::new(id, ContactFields {
    first_name: first.into(),
    last_name:  "Doe".into(),
    email:      format!("{}@example.com", first.to_lowercase()),
    phone:      "555-123-4567".into(),
  })
}

fn snapshot(contacts: &[Contact]) -> Result<Frame> {
  Ok(Frame::Text(serde_json::to_string(contacts).unwrap()))
}

async fn until(
  handle: &mut SubscriptionHandle,
  pred: impl FnMut(&DirectoryView) -> bool,
) -> DirectoryView {
  timeout(Duration::from_secs(2), handle.wait_for(pred))
    .await
    .expect("view never reached the expected state")
    .expect("channel ended before reaching the expected state")
}

fn ids(view: &DirectoryView) -> Vec<ContactId> {
  view.contacts.iter().map(|c| c.id).collect()
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn starts_connecting_then_opens() {
  let (sync, _tx) = scripted();
  let mut handle = sync.open();

  let first = handle.current();
  assert!(first.state == ChannelState::Connecting || first.state == ChannelState::Open);
  assert!(first.is_loading());
  assert!(first.contacts.is_empty());

  let open = until(&mut handle, |v| v.state == ChannelState::Open).await;
  assert!(open.is_loading());
}

#[tokio::test]
async fn each_snapshot_replaces_the_previous_one() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();

  tx.unbounded_send(snapshot(&[contact(1, "Ann"), contact(2, "Bob")])).unwrap();
  let view = until(&mut handle, |v| v.snapshots == 1).await;
  assert_eq!(view.state, ChannelState::Receiving);
  assert_eq!(ids(&view), [ContactId(1), ContactId(2)]);

  tx.unbounded_send(snapshot(&[contact(3, "Cat")])).unwrap();
  let view = until(&mut handle, |v| v.snapshots == 2).await;
  assert_eq!(ids(&view), [ContactId(3)]);

  let (contacts, state) = handle.current_snapshot();
  assert_eq!(contacts.len(), 1);
  assert_eq!(state, ChannelState::Receiving);
}

#[tokio::test]
async fn empty_snapshot_clears_the_list() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();

  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  until(&mut handle, |v| v.snapshots == 1).await;
  tx.unbounded_send(snapshot(&[])).unwrap();
  let view = until(&mut handle, |v| v.snapshots == 2).await;
  assert!(view.contacts.is_empty());
  assert!(!view.is_loading());
}

#[tokio::test]
async fn malformed_snapshot_is_discarded() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();

  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  tx.unbounded_send(Ok(Frame::Text(r#"{"not":"a list"}"#.into()))).unwrap();
  tx.unbounded_send(Ok(Frame::Text("[{\"id\":2}]".into()))).unwrap();
  tx.unbounded_send(snapshot(&[contact(1, "Ann"), contact(4, "Dan")])).unwrap();

  let view = until(&mut handle, |v| v.snapshots == 2).await;
  assert_eq!(ids(&view), [ContactId(1), ContactId(4)]);
}

#[tokio::test]
async fn server_close_keeps_the_stale_snapshot() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();

  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  tx.unbounded_send(Ok(Frame::Close)).unwrap();

  let view = until(&mut handle, |v| v.state == ChannelState::Closed).await;
  assert_eq!(ids(&view), [ContactId(1)]);
  assert!(!view.state.is_live());
}

#[tokio::test]
async fn end_of_stream_is_a_close() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();
  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  drop(tx);

  let view = until(&mut handle, |v| v.state == ChannelState::Closed).await;
  assert_eq!(view.snapshots, 1);
}

#[tokio::test]
async fn transport_error_is_terminal_and_keeps_snapshot() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();

  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  tx.unbounded_send(Err(Error::WebSocket(tungstenite::Error::ConnectionClosed)))
    .unwrap();
  // Anything after the failure is never read.
  let _ = tx.unbounded_send(snapshot(&[]));

  let view = until(&mut handle, |v| matches!(v.state, ChannelState::Error(_))).await;
  assert_eq!(ids(&view), [ContactId(1)]);

  tokio::time::sleep(Duration::from_millis(50)).await;
  assert_eq!(handle.current().snapshots, 1);
}

#[tokio::test]
async fn waiting_ends_when_the_channel_does() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();
  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  drop(tx);

  let never = timeout(Duration::from_secs(2), handle.wait_for(|v| v.snapshots == 2))
    .await
    .expect("wait_for must return once the channel is closed");
  assert!(never.is_none());
  assert_eq!(handle.current().state, ChannelState::Closed);

  let mut refused = DirectorySync::new(Refused).open();
  let never = timeout(Duration::from_secs(2), refused.wait_for(|v| v.snapshots > 0))
    .await
    .expect("wait_for must return once the handshake fails");
  assert!(never.is_none());
}

#[tokio::test]
async fn failed_handshake_is_an_error() {
  let mut handle = DirectorySync::new(Refused).open();
  let view = until(&mut handle, |v| matches!(v.state, ChannelState::Error(_))).await;
  assert!(view.contacts.is_empty());
  assert!(!view.is_loading());
}

// ─── Teardown ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn nothing_is_delivered_after_close() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();
  let observer = handle.subscribe();

  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  until(&mut handle, |v| v.snapshots == 1).await;

  let last = handle.close().await;
  assert_eq!(last.state, ChannelState::Closed);

  // The subscription task is gone, so the script has no reader left.
  assert!(tx.unbounded_send(snapshot(&[contact(2, "Bob")])).is_err());
  tokio::time::sleep(Duration::from_millis(50)).await;

  let seen = observer.borrow().clone();
  assert_eq!(seen.snapshots, 1);
  assert_eq!(ids(&seen), [ContactId(1)]);
  assert_eq!(seen.state, ChannelState::Closed);
}

#[tokio::test]
async fn dropping_the_handle_releases_the_subscription() {
  let (sync, tx) = scripted();
  let mut handle = sync.open();
  until(&mut handle, |v| v.state == ChannelState::Open).await;

  drop(handle);
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert!(tx.is_closed());
}

#[tokio::test]
async fn subscriptions_are_independent() {
  let (first_sync, first_tx) = scripted();
  let (second_sync, second_tx) = scripted();
  let mut first = first_sync.open();
  let mut second = second_sync.open();
  assert_ne!(first.session_id(), second.session_id());

  first_tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  second_tx.unbounded_send(snapshot(&[contact(2, "Bob")])).unwrap();
  assert_eq!(ids(&until(&mut first, |v| v.snapshots == 1).await), [ContactId(1)]);
  assert_eq!(ids(&until(&mut second, |v| v.snapshots == 1).await), [ContactId(2)]);

  first.close().await;
  second_tx.unbounded_send(snapshot(&[contact(3, "Cat")])).unwrap();
  assert_eq!(ids(&until(&mut second, |v| v.snapshots == 2).await), [ContactId(3)]);
}

// ─── Acknowledgement vs. snapshot ordering ───────────────────────────────────

fn gateway(server: &MockServer) -> MutationGateway {
  let api = ApiClient::new(ClientConfig {
    api_url: format!("{}/v2", server.uri()),
    ..ClientConfig::default()
  })
  .unwrap();
  MutationGateway::new(api)
}

#[tokio::test]
async fn snapshot_may_land_before_the_mutation_response() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
    .mount(&server)
    .await;

  let (sync, tx) = scripted();
  let mut handle = sync.open();
  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  until(&mut handle, |v| v.snapshots == 1).await;

  let gw = gateway(&server);
  let pending = tokio::spawn(async move { gw.create(&contact(0, "Eve").fields).await });

  tx.unbounded_send(snapshot(&[contact(5, "Eve"), contact(1, "Ann")])).unwrap();
  let view = until(&mut handle, |v| v.snapshots == 2).await;
  assert!(!pending.is_finished());
  assert_eq!(ids(&view), [ContactId(5), ContactId(1)]);

  pending.await.unwrap().unwrap();
  // The acknowledgement itself changes nothing.
  assert_eq!(handle.current(), view);
}

#[tokio::test]
async fn list_lags_until_the_snapshot_after_an_acknowledged_delete() {
  let server = MockServer::start().await;
  Mock::given(method("DELETE"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
    .mount(&server)
    .await;

  let (sync, tx) = scripted();
  let mut handle = sync.open();
  tx.unbounded_send(snapshot(&[contact(1, "Ann"), contact(2, "Bob")])).unwrap();
  until(&mut handle, |v| v.snapshots == 1).await;

  gateway(&server).remove(ContactId(2)).await.unwrap();
  // Acknowledged, but no snapshot yet: the deleted row is still shown.
  assert_eq!(ids(&handle.current()), [ContactId(1), ContactId(2)]);

  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  let view = until(&mut handle, |v| v.snapshots == 2).await;
  assert_eq!(ids(&view), [ContactId(1)]);
}

#[tokio::test]
async fn failed_mutation_leaves_the_view_untouched() {
  let server = MockServer::start().await;
  Mock::given(method("PUT"))
    .respond_with(
      ResponseTemplate::new(400).set_body_json(json!({ "message": "Oops! Email already exists" })),
    )
    .mount(&server)
    .await;

  let (sync, tx) = scripted();
  let mut handle = sync.open();
  tx.unbounded_send(snapshot(&[contact(1, "Ann")])).unwrap();
  let before = until(&mut handle, |v| v.snapshots == 1).await;

  let err = gateway(&server).update(&contact(1, "Annie")).await.unwrap_err();
  assert_eq!(err.user_message(), "Oops! Email already exists");
  assert_eq!(handle.current(), before);
}
