//! Directory list screen, plus the delete confirmation modal.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::Line,
  widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use roster_client::ChannelState;
use roster_core::Contact;

use crate::app::ListScreen;

/// Render the list screen into `area`.
pub fn draw(f: &mut Frame, area: Rect, list: &ListScreen) {
  let visible = list.visible();
  let total = list.view.contacts.len();

  let title = if list.filter_active || !list.filter.is_empty() {
    format!(" Contacts ({}/{}) ", visible.len(), total)
  } else {
    format!(" Contacts ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if (list.filter_active || !list.filter.is_empty()) && inner.height > 2 {
    let filter_area = Rect {
      x:      inner.x,
      y:      inner.y + inner.height.saturating_sub(1),
      width:  inner.width,
      height: 1,
    };
    inner.height = inner.height.saturating_sub(1);

    let filter_text = if list.filter_active {
      format!("/{}_", list.filter)
    } else {
      format!("/{}", list.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  if list.view.is_loading() {
    f.render_widget(
      Paragraph::new("Loading your contacts…").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
  } else if list.view.snapshots == 0 {
    // Never received anything, so an empty list would be a claim we can't make.
    let reason = match &list.view.state {
      ChannelState::Error(e) => format!("Directory unavailable: {e}"),
      _ => "Directory unavailable.".to_string(),
    };
    f.render_widget(
      Paragraph::new(vec![
        Line::from(reason),
        Line::from(""),
        Line::from("Press r to re-subscribe."),
      ])
      .style(Style::default().fg(Color::Red)),
      inner,
    );
  } else if total == 0 {
    f.render_widget(
      Paragraph::new(vec![
        Line::from("No contacts yet. Please add your first contact."),
        Line::from(""),
        Line::from("Press n to add a new contact."),
      ])
      .style(Style::default().fg(Color::DarkGray)),
      inner,
    );
  } else {
    draw_table(f, inner, list, &visible);
  }

  if let Some(contact) = &list.confirm_delete {
    draw_confirm(f, area, &contact.fields.first_name, &contact.fields.last_name);
  }
}

fn draw_table(
  f: &mut Frame,
  area: Rect,
  list: &ListScreen,
  visible: &[&Contact],
) {
  let header = Row::new(["Name", "Email", "Phone"]).style(
    Style::default()
      .fg(Color::DarkGray)
      .add_modifier(Modifier::BOLD),
  );

  let rows = visible.iter().map(|c| {
    Row::new([
      Cell::from(c.fields.full_name()),
      Cell::from(c.fields.email.as_str()),
      Cell::from(c.fields.phone.as_str()),
    ])
  });

  let table = Table::new(rows, [
    Constraint::Percentage(35),
    Constraint::Percentage(40),
    Constraint::Percentage(25),
  ])
  .header(header)
  .row_highlight_style(
    Style::default()
      .bg(Color::Blue)
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  let mut state = TableState::default();
  state.select(if visible.is_empty() { None } else { Some(list.cursor) });
  f.render_stateful_widget(table, area, &mut state);
}

fn draw_confirm(f: &mut Frame, area: Rect, first: &str, last: &str) {
  let modal = super::centered(area, 50, 7);
  let block = Block::default()
    .title(" Confirm Deletion ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));
  let inner = block.inner(modal);
  f.render_widget(Clear, modal);
  f.render_widget(block, modal);
  f.render_widget(
    Paragraph::new(vec![
      Line::from(format!("Are you sure you want to delete the contact for {first} {last}?")),
      Line::from(""),
      Line::from("[y] Delete   [n] Cancel"),
    ])
    .wrap(Wrap { trim: true }),
    inner,
  );
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use ratatui::{Terminal, backend::TestBackend};
  use roster_client::DirectoryView;
  use roster_core::ContactFields;

  use super::*;

  fn render(list: &ListScreen) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
    terminal
      .draw(|f| {
        let area = f.area();
        draw(f, area, list)
      })
      .unwrap();
    let buffer = terminal.backend().buffer();
    buffer.content().iter().map(|cell| cell.symbol()).collect()
  }

  fn view(state: ChannelState, snapshots: u64, contacts: Vec<Contact>) -> DirectoryView {
    DirectoryView { contacts: Arc::from(contacts), state, snapshots }
  }

  #[test]
  fn failed_channel_without_snapshot_is_not_an_empty_directory() {
    let list = ListScreen::from_view(view(
      ChannelState::Error("connection refused".into()),
      0,
      Vec::new(),
    ));
    let screen = render(&list);
    assert!(!screen.contains("No contacts yet"));
    assert!(screen.contains("Directory unavailable: connection refused"));
    assert!(screen.contains("Press r to re-subscribe"));

    let closed = ListScreen::from_view(view(ChannelState::Closed, 0, Vec::new()));
    let screen = render(&closed);
    assert!(!screen.contains("No contacts yet"));
    assert!(screen.contains("Directory unavailable."));
  }

  #[test]
  fn empty_snapshot_shows_empty_state() {
    let list = ListScreen::from_view(view(ChannelState::Receiving, 1, Vec::new()));
    assert!(render(&list).contains("No contacts yet. Please add your first contact."));

    // A stale but received empty snapshot is still a real answer.
    let stale = ListScreen::from_view(view(ChannelState::Closed, 1, Vec::new()));
    assert!(render(&stale).contains("No contacts yet."));
  }

  #[test]
  fn connecting_shows_loading() {
    let list = ListScreen::from_view(view(ChannelState::Connecting, 0, Vec::new()));
    let screen = render(&list);
    assert!(screen.contains("Loading your contacts"));
    assert!(!screen.contains("unavailable"));
  }

  #[test]
  fn snapshot_rows_are_listed() {
    let jane = Contact::new(1, ContactFields {
      first_name: "Jane".into(),
      last_name:  "Doe".into(),
      email:      "jane@example.com".into(),
      phone:      "555-123-4567".into(),
    });
    let list = ListScreen::from_view(view(ChannelState::Receiving, 1, vec![jane]));
    let screen = render(&list);
    assert!(screen.contains("Jane Doe"));
    assert!(screen.contains("jane@example.com"));
  }
}
