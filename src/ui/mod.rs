//! Ratatui front-ends for the two applications. Each app is a state machine of
//! screens and modal forms; `terminal::run_app` drives either one.

mod forms;
mod helpers;
mod library_app;
mod roster_app;
mod terminal;

pub use library_app::LibraryApp;
pub use roster_app::RosterApp;
pub use terminal::{run_app, TuiApp};
