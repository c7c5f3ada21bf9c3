//! Persistence for the library catalog and lending ledger, split across
//! logical submodules.

mod books;
mod connection;
mod error;
mod loans;
mod users;

pub use books::{create_book, fetch_available_books, fetch_book};
pub use connection::{ensure_schema, init_schema, open_in_memory};
pub use error::LibraryError;
pub use loans::{borrow_book, count_borrow_records, fetch_loans_for_user};
pub use users::{authenticate, register_user};
