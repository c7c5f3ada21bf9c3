use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use crate::models::Student;
use crate::roster::{Roster, RosterError};

use super::forms::{StudentField, StudentForm};
use super::helpers::{
    centered_rect, clamp_selection, draw_footer, hint_line, step_selection, StatusKind,
    StatusMessage,
};
use super::terminal::TuiApp;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

enum Mode {
    Normal,
    Adding(StudentForm),
    Updating { index: usize, form: StudentForm },
    ConfirmDelete { index: usize, student: Student },
}

/// State for the student roster editor.
pub struct RosterApp {
    roster: Roster,
    selected: Option<usize>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl Default for RosterApp {
    fn default() -> Self {
        Self::new(Roster::new())
    }
}

impl RosterApp {
    pub fn new(roster: Roster) -> Self {
        Self {
            roster,
            selected: None,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.selected = None;
                self.clear_status();
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Char('a') | KeyCode::Char('+') => {
                self.clear_status();
                return Mode::Adding(StudentForm::default());
            }
            KeyCode::Char('u') | KeyCode::Char('e') => {
                match self.selected.and_then(|idx| self.roster.get(idx).map(|s| (idx, s))) {
                    Some((index, student)) => {
                        let form = StudentForm::from_student(student);
                        self.clear_status();
                        return Mode::Updating { index, form };
                    }
                    None => self.report(RosterError::NoSelection { action: "update" }),
                }
            }
            KeyCode::Char('d') | KeyCode::Char('-') => {
                match self.selected.and_then(|idx| self.roster.get(idx).map(|s| (idx, s))) {
                    Some((index, student)) => {
                        let student = student.clone();
                        self.clear_status();
                        return Mode::ConfirmDelete { index, student };
                    }
                    None => self.report(RosterError::NoSelection { action: "delete" }),
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add(&mut self, code: KeyCode, mut form: StudentForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add student cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.roster.add(&form.id, &form.name, &form.age) {
                Ok(student) => {
                    let message = format!("Added student {}.", student.name);
                    self.selected = Some(self.roster.len() - 1);
                    self.set_status(message, StatusKind::Info);
                    return Mode::Normal;
                }
                Err(err) => {
                    form.error = Some(err.to_string());
                    self.report(err);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::Adding(form)
    }

    fn handle_update(&mut self, code: KeyCode, index: usize, mut form: StudentForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Update cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                match self
                    .roster
                    .update(Some(index), &form.id, &form.name, &form.age)
                {
                    Ok(()) => {
                        self.set_status(format!("Updated student {}.", form.name), StatusKind::Info);
                        return Mode::Normal;
                    }
                    Err(err) => {
                        form.error = Some(err.to_string());
                        self.report(err);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::Updating { index, form }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, index: usize, student: Student) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.roster.delete(Some(index)) {
                    Ok(removed) => {
                        self.selected = clamp_selection(self.selected, self.roster.len());
                        self.set_status(format!("Deleted student {}.", removed.name), StatusKind::Info);
                    }
                    Err(err) => self.report(err),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmDelete { index, student },
        }
    }

    fn move_selection(&mut self, delta: isize) {
        self.selected = step_selection(self.selected, self.roster.len(), delta);
    }

    fn report(&mut self, err: RosterError) {
        self.set_status(err.to_string(), StatusKind::Error);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Student Information System")
            .borders(Borders::ALL);

        if self.roster.is_empty() {
            let message = Paragraph::new("No students yet. Press 'a' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(vec![Cell::from("ID"), Cell::from("Name"), Cell::from("Age")])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.roster.students().iter().map(|student| {
            Row::new(vec![
                Cell::from(student.id.clone()),
                Cell::from(student.name.clone()),
                Cell::from(student.age.to_string()),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(25),
                Constraint::Percentage(55),
                Constraint::Percentage(20),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow))
        .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(self.selected);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_student_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &StudentForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("ID", StudentField::Id),
            form.build_line("Name", StudentField::Name),
            form.build_line("Age", StudentField::Age),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save, Tab to switch, Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (prefix, row) = match form.active {
            StudentField::Id => ("ID: ", 0),
            StudentField::Name => ("Name: ", 1),
            StudentField::Age => ("Age: ", 2),
        };
        frame.set_cursor_position((
            inner.x + prefix.len() as u16 + form.value_len(form.active) as u16,
            inner.y + row,
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, student: &Student) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(format!("Delete {} ({})?", student.name, student.id)),
            Line::from(""),
            Line::from(Span::styled(
                "y / Enter to confirm, n / Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().title("Delete Student").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match self.mode {
            Mode::Normal => hint_line(&[
                ("↑↓", "Select"),
                ("a", "Add"),
                ("u", "Update"),
                ("d", "Delete"),
                ("Esc", "Clear Selection"),
                ("q", "Quit"),
            ]),
            Mode::ConfirmDelete { .. } => hint_line(&[("y", "Delete"), ("n", "Keep")]),
            _ => hint_line(&[("Tab", "Next Field"), ("Enter", "Save"), ("Esc", "Cancel")]),
        }
    }
}

impl TuiApp for RosterApp {
    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
            .split(area);

        self.draw_table(frame, chunks[0]);
        draw_footer(frame, chunks[1], self.status.as_ref(), self.footer_instructions());

        match &self.mode {
            Mode::Adding(form) => self.draw_student_form(frame, area, "Add Student", form),
            Mode::Updating { form, .. } => {
                self.draw_student_form(frame, area, "Update Student", form)
            }
            Mode::ConfirmDelete { student, .. } => self.draw_confirm_delete(frame, area, student),
            Mode::Normal => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Adding(form) => self.handle_add(code, form),
            Mode::Updating { index, form } => self.handle_update(code, index, form),
            Mode::ConfirmDelete { index, student } => {
                self.handle_confirm_delete(code, index, student)
            }
        };

        Ok(exit)
    }
}
