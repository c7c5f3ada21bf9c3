use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use log::{error, info, warn};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{
    authenticate, borrow_book, create_book, fetch_available_books, fetch_loans_for_user,
    register_user, LibraryError,
};
use crate::models::{Book, Loan, User};

use super::forms::{BookField, BookForm, CredentialsField, CredentialsForm};
use super::helpers::{
    centered_rect, clamp_selection, draw_footer, hint_line, step_selection, surface_error,
    StatusKind, StatusMessage,
};
use super::terminal::TuiApp;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the "logged in as" banner.
const HEADER_HEIGHT: u16 = 3;

enum Screen {
    Catalog,
    Loans(Vec<Loan>),
}

enum Mode {
    Normal,
    Registering(CredentialsForm),
    LoggingIn(CredentialsForm),
    AddingBook(BookForm),
}

/// State for the library catalog and lending screens. The session (who is
/// logged in) and the list selection are plain fields handed to each
/// operation rather than globals.
pub struct LibraryApp {
    conn: Connection,
    books: Vec<Book>,
    selected: Option<usize>,
    current_user: Option<User>,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl LibraryApp {
    pub fn new(conn: Connection, books: Vec<Book>) -> Self {
        Self {
            conn,
            books,
            selected: None,
            current_user: None,
            screen: Screen::Catalog,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Books currently shown in the catalog list.
    pub fn available_books(&self) -> &[Book] {
        &self.books
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        if let Screen::Loans(_) = self.screen {
            match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc | KeyCode::Char('m') | KeyCode::Char('M') => {
                    self.screen = Screen::Catalog;
                    self.clear_status();
                }
                _ => {}
            }
            return Mode::Normal;
        }

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
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.clear_status();
                return Mode::Registering(CredentialsForm::default());
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.clear_status();
                return Mode::LoggingIn(CredentialsForm::default());
            }
            KeyCode::Char('a') | KeyCode::Char('+') => {
                self.clear_status();
                return Mode::AddingBook(BookForm::default());
            }
            KeyCode::Enter | KeyCode::Char('b') | KeyCode::Char('B') => {
                if let Err(err) = self.borrow_selected() {
                    self.report(&err);
                    if let Err(err) = self.reload_books() {
                        self.report(&err);
                    }
                }
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                if let Err(err) = self.open_loans() {
                    self.report(&err);
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_register(&mut self, code: KeyCode, mut form: CredentialsForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Registration cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match register_user(&self.conn, &form.username, &form.password) {
                Ok(user) => {
                    info!("registered user {}", user.username);
                    self.set_status("User registered successfully!", StatusKind::Info);
                    return Mode::Normal;
                }
                Err(err) => {
                    form.error = Some(surface_error(&err));
                    self.report(&err);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::Registering(form)
    }

    fn handle_login(&mut self, code: KeyCode, mut form: CredentialsForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Login cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match authenticate(&self.conn, &form.username, &form.password) {
                Ok(user) => {
                    info!("user {} logged in", user.username);
                    self.set_status(format!("Welcome, {}!", user.username), StatusKind::Info);
                    self.current_user = Some(user);
                    return Mode::Normal;
                }
                Err(err) => {
                    form.error = Some(surface_error(&err));
                    self.report(&err);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::LoggingIn(form)
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_book(&form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    form.error = Some(surface_error(&err));
                    self.report(&err);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingBook(form)
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let book = create_book(&self.conn, &form.title, &form.author, &form.genre)?;
        info!("added book #{} {:?}", book.id, book.title);
        self.reload_books()?;
        self.selected = self.books.iter().position(|b| b.id == book.id);
        self.set_status("Book added to the library successfully!", StatusKind::Info);
        Ok(())
    }

    /// Lend the highlighted book to the logged-in user. The book id comes from
    /// the selected `Book`, not from its rendered label.
    fn borrow_selected(&mut self) -> Result<()> {
        let Some(book) = self.selected.and_then(|idx| self.books.get(idx)).cloned() else {
            warn!("borrow attempted without a selection");
            self.set_status("Please select a book to borrow.", StatusKind::Warning);
            return Ok(());
        };
        let user = self
            .current_user
            .clone()
            .ok_or(LibraryError::NotLoggedIn)?;

        let record = borrow_book(&mut self.conn, &user, book.id)?;
        info!(
            "user {} borrowed book #{} (loan #{})",
            user.username, book.id, record.id
        );
        self.reload_books()?;
        self.set_status(
            format!("You have successfully borrowed {}!", book.title),
            StatusKind::Info,
        );
        Ok(())
    }

    fn open_loans(&mut self) -> Result<()> {
        let Some(user) = self.current_user.as_ref() else {
            self.set_status("Log in to see your loans.", StatusKind::Warning);
            return Ok(());
        };
        let loans = fetch_loans_for_user(&self.conn, user.id)?;
        self.screen = Screen::Loans(loans);
        self.clear_status();
        Ok(())
    }

    fn reload_books(&mut self) -> Result<()> {
        self.books = fetch_available_books(&self.conn)?;
        self.selected = clamp_selection(self.selected, self.books.len());
        Ok(())
    }

    fn move_selection(&mut self, delta: isize) {
        self.selected = step_selection(self.selected, self.books.len(), delta);
    }

    /// Show the error in the footer and log it. Known library errors are user
    /// mistakes; anything else is an unexpected failure.
    fn report(&mut self, err: &anyhow::Error) {
        let message = surface_error(err);
        if err.downcast_ref::<LibraryError>().is_some() {
            warn!("{message}");
        } else {
            error!("{err:#}");
        }
        self.set_status(message, StatusKind::Error);
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

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let session = match &self.current_user {
            Some(user) => Line::from(vec![
                Span::raw("Logged in as "),
                Span::styled(
                    user.username.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            None => Line::from(Span::styled(
                "Not logged in",
                Style::default().fg(Color::DarkGray),
            )),
        };
        let paragraph = Paragraph::new(session).block(
            Block::default()
                .title("Library Management System")
                .borders(Borders::ALL),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Available Books")
            .borders(Borders::ALL);

        if self.books.is_empty() {
            let message = Paragraph::new("No books available. Press 'a' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .books
            .iter()
            .map(|book| ListItem::new(book.listing_label()))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow))
            .highlight_symbol("> ");

        let mut state = ListState::default().with_selected(self.selected);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_loans(&self, frame: &mut Frame, area: Rect, loans: &[Loan]) {
        let block = Block::default().title("My Loans").borders(Borders::ALL);
        if loans.is_empty() {
            let message = Paragraph::new("You have not borrowed any books yet.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = loans
            .iter()
            .map(|loan| ListItem::new(loan.display_line()))
            .collect();
        frame.render_widget(List::new(items).block(block), area);
    }

    fn draw_credentials_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        form: &CredentialsForm,
    ) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Username", CredentialsField::Username),
            form.build_line("Password", CredentialsField::Password),
            Line::from(""),
        ];
        push_form_footer(&mut lines, form.error.as_deref());
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (prefix, row) = match form.active {
            CredentialsField::Username => ("Username: ", 0),
            CredentialsField::Password => ("Password: ", 1),
        };
        frame.set_cursor_position((
            inner.x + prefix.len() as u16 + form.value_len(form.active) as u16,
            inner.y + row,
        ));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Title", BookField::Title),
            form.build_line("Author", BookField::Author),
            form.build_line("Genre", BookField::Genre),
            Line::from(""),
        ];
        push_form_footer(&mut lines, form.error.as_deref());
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (prefix, row) = match form.active {
            BookField::Title => ("Title: ", 0),
            BookField::Author => ("Author: ", 1),
            BookField::Genre => ("Genre: ", 2),
        };
        frame.set_cursor_position((
            inner.x + prefix.len() as u16 + form.value_len(form.active) as u16,
            inner.y + row,
        ));
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (_, Mode::Registering(_)) | (_, Mode::LoggingIn(_)) | (_, Mode::AddingBook(_)) => {
                hint_line(&[("Tab", "Next Field"), ("Enter", "Submit"), ("Esc", "Cancel")])
            }
            (Screen::Loans(_), _) => hint_line(&[("m", "Back to Catalog"), ("q", "Quit")]),
            (Screen::Catalog, _) => hint_line(&[
                ("↑↓", "Select"),
                ("Enter", "Borrow"),
                ("a", "Add Book"),
                ("r", "Register"),
                ("l", "Login"),
                ("m", "My Loans"),
                ("q", "Quit"),
            ]),
        }
    }
}

fn push_form_footer(lines: &mut Vec<Line<'static>>, error: Option<&str>) {
    if let Some(error) = error {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Enter to submit, Tab to switch, Esc to cancel",
            Style::default().fg(Color::Gray),
        )));
    }
}

impl TuiApp for LibraryApp {
    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT.min(area.height)),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        match &self.screen {
            Screen::Catalog => self.draw_catalog(frame, chunks[1]),
            Screen::Loans(loans) => self.draw_loans(frame, chunks[1], loans),
        }
        draw_footer(frame, chunks[2], self.status.as_ref(), self.footer_instructions());

        match &self.mode {
            Mode::Registering(form) => self.draw_credentials_form(frame, area, "Register", form),
            Mode::LoggingIn(form) => self.draw_credentials_form(frame, area, "Login", form),
            Mode::AddingBook(form) => self.draw_book_form(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Registering(form) => self.handle_register(code, form),
            Mode::LoggingIn(form) => self.handle_login(code, form),
            Mode::AddingBook(form) => self.handle_add_book(code, form),
        };

        Ok(exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_borrow_records, open_in_memory};

    fn new_app() -> LibraryApp {
        let conn = open_in_memory().unwrap();
        LibraryApp::new(conn, Vec::new())
    }

    fn press(app: &mut LibraryApp, codes: &[KeyCode]) {
        for code in codes {
            app.handle_key(*code).unwrap();
        }
    }

    fn type_text(app: &mut LibraryApp, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn submit_credentials(app: &mut LibraryApp, key: char, username: &str, password: &str) {
        press(app, &[KeyCode::Char(key)]);
        type_text(app, username);
        press(app, &[KeyCode::Tab]);
        type_text(app, password);
        press(app, &[KeyCode::Enter]);
    }

    fn add_book(app: &mut LibraryApp, title: &str, author: &str, genre: &str) {
        press(app, &[KeyCode::Char('a')]);
        type_text(app, title);
        press(app, &[KeyCode::Tab]);
        type_text(app, author);
        press(app, &[KeyCode::Tab]);
        type_text(app, genre);
        press(app, &[KeyCode::Enter]);
    }

    fn status(app: &LibraryApp) -> Option<(&str, StatusKind)> {
        app.status.as_ref().map(|s| (s.text.as_str(), s.kind))
    }

    fn labels(app: &LibraryApp) -> Vec<String> {
        app.available_books()
            .iter()
            .map(Book::listing_label)
            .collect()
    }

    #[test]
    fn register_login_add_and_borrow() {
        let mut app = new_app();

        submit_credentials(&mut app, 'r', "alice", "pw1");
        assert_eq!(status(&app), Some(("User registered successfully!", StatusKind::Info)));

        submit_credentials(&mut app, 'l', "alice", "pw1");
        assert_eq!(app.current_user().map(|u| u.username.as_str()), Some("alice"));

        add_book(&mut app, "Dune", "Herbert", "SciFi");
        assert_eq!(labels(&app), ["ID: 1 - Dune by Herbert (SciFi)"]);
        assert_eq!(app.selected, Some(0));

        press(&mut app, &[KeyCode::Enter]);
        assert!(labels(&app).is_empty());
        assert_eq!(app.selected, None);
        assert_eq!(count_borrow_records(app.connection(), 1).unwrap(), 1);
    }

    #[test]
    fn borrowing_without_selection_warns_and_records_nothing() {
        let mut app = new_app();
        submit_credentials(&mut app, 'r', "alice", "pw1");
        submit_credentials(&mut app, 'l', "alice", "pw1");
        add_book(&mut app, "Dune", "Herbert", "SciFi");

        press(&mut app, &[KeyCode::Esc, KeyCode::Char('b')]);

        assert_eq!(
            status(&app),
            Some(("Please select a book to borrow.", StatusKind::Warning))
        );
        assert_eq!(labels(&app).len(), 1);
        assert_eq!(count_borrow_records(app.connection(), 1).unwrap(), 0);
    }

    #[test]
    fn borrowing_requires_login() {
        let mut app = new_app();
        add_book(&mut app, "Dune", "Herbert", "SciFi");

        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(
            status(&app),
            Some(("Please log in before borrowing a book.", StatusKind::Error))
        );
        assert_eq!(labels(&app).len(), 1);
        assert_eq!(count_borrow_records(app.connection(), 1).unwrap(), 0);
    }

    #[test]
    fn duplicate_registration_keeps_the_form_open() {
        let mut app = new_app();
        submit_credentials(&mut app, 'r', "alice", "pw1");
        submit_credentials(&mut app, 'r', "alice", "pw2");

        match &app.mode {
            Mode::Registering(form) => {
                assert_eq!(form.error.as_deref(), Some("Username 'alice' already exists."))
            }
            _ => panic!("register form should stay open"),
        }
    }

    #[test]
    fn failed_login_leaves_session_empty() {
        let mut app = new_app();
        submit_credentials(&mut app, 'r', "alice", "pw1");
        submit_credentials(&mut app, 'l', "alice", "nope");

        assert!(app.current_user().is_none());
        assert_eq!(
            status(&app),
            Some(("Invalid username or password.", StatusKind::Error))
        );
    }

    #[test]
    fn loans_screen_lists_borrowed_books() {
        let mut app = new_app();
        press(&mut app, &[KeyCode::Char('m')]);
        assert!(matches!(app.screen, Screen::Catalog));
        assert_eq!(status(&app), Some(("Log in to see your loans.", StatusKind::Warning)));

        submit_credentials(&mut app, 'r', "alice", "pw1");
        submit_credentials(&mut app, 'l', "alice", "pw1");
        add_book(&mut app, "Dune", "Herbert", "SciFi");
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('m')]);

        match &app.screen {
            Screen::Loans(loans) => {
                assert_eq!(loans.len(), 1);
                assert_eq!(loans[0].book.title, "Dune");
            }
            Screen::Catalog => panic!("loans screen should be open"),
        }

        press(&mut app, &[KeyCode::Esc]);
        assert!(matches!(app.screen, Screen::Catalog));
    }
}
