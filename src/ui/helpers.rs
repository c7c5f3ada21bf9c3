use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// Footer message text plus its severity.
pub(crate) struct StatusMessage {
    pub(crate) text: String,
    pub(crate) kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    pub(crate) fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Move an optional list selection by `delta`, clamping at both ends. With
/// nothing selected, moving down picks the first row and moving up the last.
pub(crate) fn step_selection(selected: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = len as isize - 1;
    let next = match selected {
        Some(current) => (current as isize + delta).clamp(0, last),
        None if delta >= 0 => 0,
        None => last,
    };
    Some(next as usize)
}

/// Keep a selection valid after the underlying list shrank.
pub(crate) fn clamp_selection(selected: Option<usize>, len: usize) -> Option<usize> {
    match selected {
        Some(_) if len == 0 => None,
        Some(idx) if idx >= len => Some(len - 1),
        other => other,
    }
}

/// Style shared by every `[key]` hint in the footers.
pub(crate) fn key_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Build a footer hint line out of `(key, label)` pairs.
pub(crate) fn hint_line(hints: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (idx, (key, label)) in hints.iter().enumerate() {
        spans.push(Span::styled(format!("[{key}]"), key_style()));
        if idx + 1 == hints.len() {
            spans.push(Span::raw(format!(" {label}")));
        } else {
            spans.push(Span::raw(format!(" {label}   ")));
        }
    }
    Line::from(spans)
}

/// Render the status message above the key hints.
pub(crate) fn draw_footer(
    frame: &mut Frame,
    area: Rect,
    status: Option<&StatusMessage>,
    instructions: Line<'static>,
) {
    let block = Block::default().borders(Borders::TOP);
    frame.render_widget(block.clone(), area);
    let inner = block.inner(area);

    let status_line = if let Some(status) = status {
        Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
    } else {
        Line::from("")
    };

    let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn step_selection_starts_from_either_end() {
        assert_eq!(step_selection(None, 3, 1), Some(0));
        assert_eq!(step_selection(None, 3, -1), Some(2));
        assert_eq!(step_selection(None, 0, 1), None);
    }

    #[test]
    fn step_selection_clamps() {
        assert_eq!(step_selection(Some(2), 3, 1), Some(2));
        assert_eq!(step_selection(Some(0), 3, -1), Some(0));
        assert_eq!(step_selection(Some(1), 10, 5), Some(6));
    }

    #[test]
    fn clamp_selection_follows_shrinking_lists() {
        assert_eq!(clamp_selection(Some(4), 2), Some(1));
        assert_eq!(clamp_selection(Some(0), 0), None);
        assert_eq!(clamp_selection(None, 5), None);
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = Err::<(), _>(anyhow!("Username 'a' already exists."))
            .context("failed to insert user")
            .unwrap_err();
        assert_eq!(surface_error(&err), "Username 'a' already exists.");
    }
}
