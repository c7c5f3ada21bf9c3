//! Library manager: catalog, accounts, and borrowing on top of SQLite.
use library_roster_manager::{
    ensure_schema, fetch_available_books, logging, run_app, AppConfig, LibraryApp,
};

/// Open the database in the data directory, preload the catalog, and run the
/// terminal UI until the user quits.
fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.log_path("library"))?;

    let conn = ensure_schema(&config.db_path())?;
    let books = fetch_available_books(&conn)?;
    log::info!("library started with {} available books", books.len());

    let mut app = LibraryApp::new(conn, books);
    let result = run_app(&mut app);
    log::info!("library shutting down");
    result
}
