//! History screen: the contact's current record and its audit log.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use roster_core::HistoryRow;

use crate::app::HistoryScreen;

pub fn draw(f: &mut Frame, area: Rect, history: &HistoryScreen) {
  let block = Block::default()
    .title(" Contact History ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if history.loading {
    f.render_widget(
      Paragraph::new(format!("Loading history for contact {}…", history.id))
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }
  if let Some(err) = &history.error {
    f.render_widget(
      Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
      inner,
    );
    return;
  }
  let Some(data) = &history.data else { return };

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(4), Constraint::Min(0)])
    .split(inner);

  let contact = &data.contact.fields;
  let header = vec![
    Line::from(Span::styled(
      contact.full_name(),
      Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )),
    labelled("Current Email", &contact.email),
    labelled("Current Phone", &contact.phone),
  ];
  f.render_widget(Paragraph::new(header), chunks[0]);

  if data.entries.is_empty() {
    f.render_widget(
      Paragraph::new("No history available.").style(Style::default().fg(Color::DarkGray)),
      chunks[1],
    );
    return;
  }

  let items: Vec<ListItem> = data.entries.iter().map(|e| entry_item(e.row())).collect();
  let list = List::new(items).highlight_style(Style::default().bg(Color::Rgb(30, 30, 40)));
  let mut state = ListState::default();
  state.select(Some(history.scroll));
  f.render_stateful_widget(list, chunks[1], &mut state);
}

fn labelled(label: &str, value: &str) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
    Span::raw(value.to_string()),
  ])
}

fn entry_item(row: HistoryRow) -> ListItem<'static> {
  ListItem::new(vec![
    Line::from(Span::styled(row.timestamp, Style::default().fg(Color::Yellow))),
    labelled("  Name", &format!("{} {}", row.first_name, row.last_name)),
    labelled("  Email", &row.email),
    labelled("  Phone", &row.phone),
    Line::from(""),
  ])
}
