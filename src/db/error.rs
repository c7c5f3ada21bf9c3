use thiserror::Error;

/// Failures the library screens report back to the user. Unexpected SQLite
/// errors are not listed here; they travel as plain `anyhow` errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("{0} is required.")]
    MissingField(&'static str),
    #[error("Username '{0}' already exists.")]
    DuplicateUsername(String),
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("Please log in before borrowing a book.")]
    NotLoggedIn,
    #[error("Book {0} is no longer available.")]
    BookUnavailable(i64),
    #[error("Book {0} does not exist.")]
    BookNotFound(i64),
    #[error("failed to process password: {0}")]
    PasswordHash(String),
}
