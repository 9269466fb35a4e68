//! Add / edit form.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use roster_core::Field;

use crate::app::FormScreen;

/// Rows per input: label, value box (3), error line.
const FIELD_HEIGHT: u16 = 5;

pub fn draw(f: &mut Frame, area: Rect, form: &FormScreen) {
  let title = if form.editing.is_some() { " Edit Contact " } else { " Add New Contact " };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if form.loading {
    f.render_widget(
      Paragraph::new("Loading contact…").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let mut constraints: Vec<Constraint> =
    Field::ALL.iter().map(|_| Constraint::Length(FIELD_HEIGHT)).collect();
  constraints.push(Constraint::Length(1)); // global error
  constraints.push(Constraint::Length(1)); // submit button
  constraints.push(Constraint::Min(0));

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints(constraints)
    .split(inner);

  for (i, field) in Field::ALL.into_iter().enumerate() {
    draw_input(f, rows[i], form, field);
  }

  if let Some(err) = &form.global_error {
    f.render_widget(
      Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
      rows[Field::ALL.len()],
    );
  }

  let label = match (form.gate.is_pending(), form.editing.is_some()) {
    (true, true) => "Updating…",
    (true, false) => "Adding…",
    (false, true) => "[Enter] Update Contact",
    (false, false) => "[Enter] Add Contact",
  };
  f.render_widget(
    Paragraph::new(label).style(
      Style::default()
        .fg(if form.busy() { Color::DarkGray } else { Color::Cyan })
        .add_modifier(Modifier::BOLD),
    ),
    rows[Field::ALL.len() + 1],
  );
}

fn draw_input(f: &mut Frame, area: Rect, form: &FormScreen, field: Field) {
  let focused = form.focus == field;
  let error = form.errors.get(field);

  let parts = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Length(3), Constraint::Length(1)])
    .split(area);

  f.render_widget(
    Paragraph::new(Span::styled(
      field.label(),
      Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
    )),
    parts[0],
  );

  let border = match (focused, error.is_some()) {
    (_, true) => Color::Red,
    (true, false) => Color::Cyan,
    (false, false) => Color::DarkGray,
  };
  let value = form.fields.get(field);
  let text = if focused && !form.busy() { format!("{value}_") } else { value.to_string() };
  f.render_widget(
    Paragraph::new(Line::from(text)).block(
      Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border)),
    ),
    parts[1],
  );

  if let Some(message) = error {
    f.render_widget(
      Paragraph::new(message).style(Style::default().fg(Color::Red)),
      parts[2],
    );
  }
}
