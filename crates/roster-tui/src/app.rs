//! Application state machine and event dispatcher.
//!
//! Each screen visit owns its state outright. Leaving a screen drops that
//! state (closing the list's push subscription on the way out), and every
//! background request is tagged with the visit that issued it, so a late
//! result can never write into a screen that has since been replaced.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use roster_client::{
  ContactHistory, DirectorySync, DirectoryView, HistoryReader, MutationGateway, MutationKind,
  Notice, SubmitGate, SubmitPermit, SubscriptionHandle, WsTransport,
};
use roster_core::{Contact, ContactFields, ContactId, Field, FieldErrors, validate};
use tokio::sync::mpsc;

/// How long a notice stays in the status bar.
const NOTICE_TTL: Duration = Duration::from_secs(4);

// ─── Services ─────────────────────────────────────────────────────────────────

/// The network collaborators the screens drive.
#[derive(Clone)]
pub struct Services {
  pub gateway: MutationGateway,
  pub reader:  HistoryReader,
  pub sync:    DirectorySync<WsTransport>,
}

// ─── Background results ───────────────────────────────────────────────────────

/// A settled background request, tagged with the visit that started it.
pub enum AppEvent {
  Mutation {
    visit:   u64,
    kind:    MutationKind,
    outcome: roster_client::Result<()>,
    /// Keeps the issuing gate closed until the outcome has been applied.
    permit:  SubmitPermit,
  },
  ContactLoaded {
    visit:   u64,
    outcome: roster_client::Result<Contact>,
  },
  HistoryLoaded {
    visit:   u64,
    outcome: roster_client::Result<ContactHistory>,
  },
}

// ─── Screens ──────────────────────────────────────────────────────────────────

/// The directory list. Owns one push subscription per visit.
pub struct ListScreen {
  subscription:       Option<SubscriptionHandle>,
  /// Latest view copied out of the subscription on every tick.
  pub view:           DirectoryView,
  pub cursor:         usize,
  pub filter:         String,
  pub filter_active:  bool,
  /// Contact awaiting delete confirmation.
  pub confirm_delete: Option<Contact>,
  pub deleting:       SubmitGate,
}

impl ListScreen {
  fn new(subscription: SubscriptionHandle) -> Self {
    let view = subscription.current();
    Self {
      subscription: Some(subscription),
      view,
      cursor: 0,
      filter: String::new(),
      filter_active: false,
      confirm_delete: None,
      deleting: SubmitGate::new(),
    }
  }

  /// A list showing `view` with no subscription behind it.
  #[cfg(test)]
  pub(crate) fn from_view(view: DirectoryView) -> Self {
    Self {
      subscription: None,
      view,
      cursor: 0,
      filter: String::new(),
      filter_active: false,
      confirm_delete: None,
      deleting: SubmitGate::new(),
    }
  }

  fn refresh(&mut self) {
    if let Some(sub) = &self.subscription {
      self.view = sub.current();
    }
    let len = self.visible().len();
    if self.cursor >= len {
      self.cursor = len.saturating_sub(1);
    }
  }

  /// Contacts from the current snapshot that match the filter, in snapshot
  /// order.
  pub fn visible(&self) -> Vec<&Contact> {
    if self.filter.is_empty() {
      return self.view.contacts.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .view
      .contacts
      .iter()
      .filter(|c| {
        let f = &c.fields;
        let haystack = format!("{} {} {} {}", f.first_name, f.last_name, f.email, f.phone);
        matcher.fuzzy_match(&haystack, &self.filter).is_some()
      })
      .collect()
  }

  pub fn selected(&self) -> Option<&Contact> { self.visible().get(self.cursor).copied() }
}

/// New / edit form.
pub struct FormScreen {
  pub editing:      Option<ContactId>,
  pub fields:       ContactFields,
  pub focus:        Field,
  pub errors:       FieldErrors,
  pub global_error: Option<String>,
  /// Waiting for the record being edited.
  pub loading:      bool,
  pub gate:         SubmitGate,
}

impl FormScreen {
  fn new(editing: Option<ContactId>) -> Self {
    Self {
      editing,
      fields: ContactFields::default(),
      focus: Field::FirstName,
      errors: FieldErrors::default(),
      global_error: None,
      loading: editing.is_some(),
      gate: SubmitGate::new(),
    }
  }

  /// Input and submission are disabled while this is true.
  pub fn busy(&self) -> bool { self.loading || self.gate.is_pending() }
}

/// One contact's audit log.
pub struct HistoryScreen {
  pub id:      ContactId,
  pub loading: bool,
  pub data:    Option<ContactHistory>,
  pub error:   Option<String>,
  pub scroll:  usize,
}

pub enum Screen {
  List(ListScreen),
  Form(FormScreen),
  History(HistoryScreen),
}

/// Follow-up a key handler asks for once its screen borrow has ended.
enum Action {
  Stay,
  Quit,
  ShowList,
  ShowForm(Option<ContactId>),
  ShowHistory(ContactId),
  Resubscribe,
  Delete(ContactId),
  Submit,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen: Screen,
  /// Transient notice and when it was raised.
  pub notice: Option<(Notice, Instant)>,
  visit:      u64,
  services:   Services,
  events_tx:  mpsc::UnboundedSender<AppEvent>,
  events_rx:  mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
  /// Create an [`App`] showing the list screen. Must run inside a tokio
  /// runtime, since the list subscribes immediately.
  pub fn new(services: Services) -> Self {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let screen = Screen::List(ListScreen::new(services.sync.open()));
    Self { screen, notice: None, visit: 0, services, events_tx, events_rx }
  }

  /// Per-frame housekeeping: pull the latest snapshot, expire notices.
  pub fn tick(&mut self) {
    if let Screen::List(list) = &mut self.screen {
      list.refresh();
    }
    if self
      .notice
      .as_ref()
      .is_some_and(|(_, at)| at.elapsed() >= NOTICE_TTL)
    {
      self.notice = None;
    }
  }

  fn notify(&mut self, notice: Notice) { self.notice = Some((notice, Instant::now())); }

  /// Release everything the current screen holds. Called on quit.
  pub async fn shutdown(&mut self) { self.leave().await; }

  // ── Navigation ────────────────────────────────────────────────────────────

  async fn leave(&mut self) {
    self.visit += 1;
    if let Screen::List(list) = &mut self.screen
      && let Some(sub) = list.subscription.take()
    {
      sub.close().await;
    }
  }

  async fn show_list(&mut self) {
    self.leave().await;
    self.screen = Screen::List(ListScreen::new(self.services.sync.open()));
  }

  async fn show_form(&mut self, editing: Option<ContactId>) {
    self.leave().await;
    if let Some(id) = editing {
      let reader = self.services.reader.clone();
      let tx = self.events_tx.clone();
      let visit = self.visit;
      tokio::spawn(async move {
        let outcome = reader.get_contact(id).await;
        let _ = tx.send(AppEvent::ContactLoaded { visit, outcome });
      });
    }
    self.screen = Screen::Form(FormScreen::new(editing));
  }

  async fn show_history(&mut self, id: ContactId) {
    self.leave().await;
    let reader = self.services.reader.clone();
    let tx = self.events_tx.clone();
    let visit = self.visit;
    tokio::spawn(async move {
      let outcome = reader.load(id).await;
      let _ = tx.send(AppEvent::HistoryLoaded { visit, outcome });
    });
    self.screen = Screen::History(HistoryScreen {
      id,
      loading: true,
      data: None,
      error: None,
      scroll: 0,
    });
  }

  /// Replace a finished subscription with a fresh one on the same visit.
  async fn resubscribe(&mut self) {
    let Screen::List(list) = &mut self.screen else { return };
    if let Some(old) = list.subscription.take() {
      old.close().await;
    }
    let fresh = self.services.sync.open();
    tracing::info!(session = %fresh.session_id(), "re-subscribing to directory");
    list.view = fresh.current();
    list.subscription = Some(fresh);
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  fn delete(&mut self, id: ContactId) {
    let Screen::List(list) = &mut self.screen else { return };
    let Some(permit) = list.deleting.try_begin() else {
      tracing::debug!(contact = %id, "delete already pending; ignoring");
      return;
    };
    let gateway = self.services.gateway.clone();
    let tx = self.events_tx.clone();
    let visit = self.visit;
    tokio::spawn(async move {
      let outcome = gateway.remove(id).await;
      let _ = tx.send(AppEvent::Mutation { visit, kind: MutationKind::Delete, outcome, permit });
    });
  }

  fn submit(&mut self) {
    let Screen::Form(form) = &mut self.screen else { return };
    if form.loading {
      return;
    }
    form.errors = validate(&form.fields);
    if !form.errors.is_empty() {
      return;
    }
    let Some(permit) = form.gate.try_begin() else { return };
    form.global_error = None;

    let gateway = self.services.gateway.clone();
    let tx = self.events_tx.clone();
    let visit = self.visit;
    let fields = form.fields.clone();
    let editing = form.editing;
    tokio::spawn(async move {
      let (kind, outcome) = match editing {
        Some(id) => (MutationKind::Update, gateway.update(&Contact::new(id, fields)).await),
        None => (MutationKind::Create, gateway.create(&fields).await),
      };
      let _ = tx.send(AppEvent::Mutation { visit, kind, outcome, permit });
    });
  }

  // ── Background results ────────────────────────────────────────────────────

  /// Apply every result that has settled since the last call.
  pub async fn drain_events(&mut self) {
    while let Ok(event) = self.events_rx.try_recv() {
      self.handle_event(event).await;
    }
  }

  async fn handle_event(&mut self, event: AppEvent) {
    match event {
      AppEvent::Mutation { visit, kind, outcome, permit } => {
        self.notify(Notice::for_outcome(kind, &outcome));
        if visit != self.visit {
          tracing::debug!(?kind, "mutation settled after its screen closed");
          return;
        }
        // The list itself only ever changes through snapshots.
        if let Screen::Form(form) = &mut self.screen {
          match outcome {
            Ok(()) => {
              drop(permit);
              self.show_list().await;
            }
            Err(e) => form.global_error = Some(e.user_message().to_string()),
          }
        }
      }
      AppEvent::ContactLoaded { visit, outcome } => {
        if visit != self.visit {
          return;
        }
        let Screen::Form(form) = &mut self.screen else { return };
        form.loading = false;
        match outcome {
          Ok(contact) => form.fields = contact.fields,
          Err(e) => {
            let message = e.user_message().to_string();
            form.global_error = Some(message.clone());
            self.notify(Notice::error(message));
          }
        }
      }
      AppEvent::HistoryLoaded { visit, outcome } => {
        if visit != self.visit {
          return;
        }
        let Screen::History(history) = &mut self.screen else { return };
        history.loading = false;
        match outcome {
          Ok(data) => history.data = Some(data),
          Err(e) => {
            history.error = Some(format!("Error fetching contact: {}", e.user_message()));
          }
        }
      }
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    let action = match &mut self.screen {
      Screen::List(list) => list_key(list, key),
      Screen::Form(form) => form_key(form, key),
      Screen::History(history) => history_key(history, key),
    };

    match action {
      Action::Stay => {}
      Action::Quit => return false,
      Action::ShowList => self.show_list().await,
      Action::ShowForm(editing) => self.show_form(editing).await,
      Action::ShowHistory(id) => self.show_history(id).await,
      Action::Resubscribe => self.resubscribe().await,
      Action::Delete(id) => self.delete(id),
      Action::Submit => self.submit(),
    }
    true
  }
}

fn list_key(list: &mut ListScreen, key: KeyEvent) -> Action {
  if let Some(contact) = &list.confirm_delete {
    let id = contact.id;
    return match key.code {
      KeyCode::Char('y') | KeyCode::Enter => {
        list.confirm_delete = None;
        Action::Delete(id)
      }
      KeyCode::Char('n') | KeyCode::Esc => {
        list.confirm_delete = None;
        Action::Stay
      }
      _ => Action::Stay,
    };
  }

  if list.filter_active {
    match key.code {
      KeyCode::Esc => {
        list.filter_active = false;
        list.filter.clear();
      }
      KeyCode::Enter => list.filter_active = false,
      KeyCode::Backspace => {
        list.filter.pop();
      }
      KeyCode::Char(c) => list.filter.push(c),
      _ => {}
    }
    list.cursor = 0;
    return Action::Stay;
  }

  match key.code {
    KeyCode::Char('q') => Action::Quit,
    KeyCode::Down | KeyCode::Char('j') => {
      if list.cursor + 1 < list.visible().len() {
        list.cursor += 1;
      }
      Action::Stay
    }
    KeyCode::Up | KeyCode::Char('k') => {
      list.cursor = list.cursor.saturating_sub(1);
      Action::Stay
    }
    KeyCode::Char('/') => {
      list.filter_active = true;
      list.filter.clear();
      list.cursor = 0;
      Action::Stay
    }
    KeyCode::Char('n') | KeyCode::Char('a') => Action::ShowForm(None),
    KeyCode::Enter | KeyCode::Char('e') => match list.selected() {
      Some(c) => Action::ShowForm(Some(c.id)),
      None => Action::Stay,
    },
    KeyCode::Char('h') => match list.selected() {
      Some(c) => Action::ShowHistory(c.id),
      None => Action::Stay,
    },
    KeyCode::Char('d') | KeyCode::Delete => {
      list.confirm_delete = list.selected().cloned();
      Action::Stay
    }
    KeyCode::Char('r') if !list.view.state.is_live() => Action::Resubscribe,
    _ => Action::Stay,
  }
}

fn form_key(form: &mut FormScreen, key: KeyEvent) -> Action {
  match key.code {
    KeyCode::Esc => return Action::ShowList,
    KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
    KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
    KeyCode::Enter if !form.busy() => return Action::Submit,
    KeyCode::Backspace if !form.busy() => {
      form.fields.get_mut(form.focus).pop();
    }
    KeyCode::Char(c) if !form.busy() => form.fields.get_mut(form.focus).push(c),
    _ => {}
  }
  Action::Stay
}

fn history_key(history: &mut HistoryScreen, key: KeyEvent) -> Action {
  let len = history.data.as_ref().map_or(0, |d| d.entries.len());
  match key.code {
    KeyCode::Esc | KeyCode::Left | KeyCode::Char('q') | KeyCode::Char('h') => {
      return Action::ShowList;
    }
    KeyCode::Down | KeyCode::Char('j') if history.scroll + 1 < len => history.scroll += 1,
    KeyCode::Up | KeyCode::Char('k') => history.scroll = history.scroll.saturating_sub(1),
    _ => {}
  }
  Action::Stay
}
