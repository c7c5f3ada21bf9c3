//! Core library for the roster editor and library manager terminal apps.
//!
//! The `roster` and `db` modules hold the domain operations; `ui` wires them to
//! key bindings. Both binaries under `src/bin` are thin wrappers around these.
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod roster;
pub mod ui;

pub use config::AppConfig;

/// Persistence entry points used by the `library` binary.
pub use db::{ensure_schema, fetch_available_books, LibraryError};

pub use models::{Book, BorrowRecord, Loan, Student, User};
pub use roster::{Roster, RosterError};

/// The interactive applications and the loop that runs them.
pub use ui::{run_app, LibraryApp, RosterApp};
