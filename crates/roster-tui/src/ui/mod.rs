//! Frame rendering: header, active screen, status bar.

pub mod contact_form;
pub mod contact_history;
pub mod contact_list;

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};
use roster_client::{ChannelState, NoticeLevel};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Draw one frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match &app.screen {
    Screen::List(list) => contact_list::draw(f, rows[1], list),
    Screen::Form(form) => contact_form::draw(f, rows[1], form),
    Screen::History(history) => contact_history::draw(f, rows[1], history),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let title = match &app.screen {
    Screen::List(_) => " roster  Contacts",
    Screen::Form(form) if form.editing.is_some() => " roster  Edit Contact",
    Screen::Form(_) => " roster  Add New Contact",
    Screen::History(_) => " roster  Contact History",
  };
  let left = Span::styled(
    title,
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  // Channel status only means something while the list is mounted.
  let right = match &app.screen {
    Screen::List(list) => channel_span(&list.view.state),
    _ => Span::raw(""),
  };

  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

fn channel_span(state: &ChannelState) -> Span<'static> {
  let color = match state {
    ChannelState::Receiving => Color::Green,
    ChannelState::Connecting | ChannelState::Open => Color::Yellow,
    ChannelState::Idle | ChannelState::Closed => Color::Gray,
    ChannelState::Error(_) => Color::Red,
  };
  Span::styled(format!("● {} ", state.label()), Style::default().fg(color))
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match &app.screen {
    Screen::List(list) if list.confirm_delete.is_some() => ("CONFIRM", "y delete  n cancel"),
    Screen::List(list) if list.filter_active => {
      ("SEARCH", "Type to filter  Esc cancel  Enter keep")
    }
    Screen::List(list) if !list.view.state.is_live() => (
      "STALE",
      "r re-subscribe  ↑↓/jk navigate  n new  e edit  d delete  h history  q quit",
    ),
    Screen::List(list) if list.deleting.is_pending() => ("NORMAL", "Deleting…"),
    Screen::List(_) => (
      "NORMAL",
      "↑↓/jk navigate  / search  n new  e edit  d delete  h history  q quit",
    ),
    Screen::Form(form) if form.busy() => ("FORM", "Working…"),
    Screen::Form(_) => ("FORM", "Tab/↑↓ field  Enter submit  Esc back"),
    Screen::History(_) => ("HISTORY", "↑↓/jk scroll  Esc back"),
  };

  let (text, style) = match &app.notice {
    Some((notice, _)) => {
      let color = match notice.level {
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Error => Color::Red,
      };
      (notice.message.clone(), Style::default().fg(color).add_modifier(Modifier::BOLD))
    }
    None => (hints.to_string(), Style::default().fg(Color::DarkGray)),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let text_span = Span::styled(format!("  {text}"), style);

  let line = Line::from(vec![mode_span, text_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

/// A `width`×`height` rectangle centred in `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}
