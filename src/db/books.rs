use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::error::LibraryError;
use crate::models::Book;

/// Insert a new, available book and return the hydrated struct.
pub fn create_book(conn: &Connection, title: &str, author: &str, genre: &str) -> Result<Book> {
    let title = title.trim();
    let author = author.trim();
    let genre = genre.trim();
    if title.is_empty() {
        return Err(LibraryError::MissingField("Title").into());
    }
    if author.is_empty() {
        return Err(LibraryError::MissingField("Author").into());
    }

    conn.execute(
        "INSERT INTO books (title, author, genre, is_available) VALUES (?1, ?2, ?3, 1)",
        params![title, author, genre],
    )
    .context("failed to insert book")?;

    let id = conn.last_insert_rowid();
    debug!("added book #{id} {title:?}");
    Ok(Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
        genre: genre.to_string(),
        available: true,
    })
}

/// Every book that can currently be borrowed, oldest catalog entry first.
pub fn fetch_available_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare(
            "SELECT book_id, title, author, genre, is_available
             FROM books
             WHERE is_available = 1
             ORDER BY book_id",
        )
        .context("failed to prepare available books query")?;

    let books = stmt
        .query_map([], book_from_row)
        .context("failed to load available books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect available books")?;

    Ok(books)
}

pub fn fetch_book(conn: &Connection, id: i64) -> Result<Option<Book>> {
    conn.query_row(
        "SELECT book_id, title, author, genre, is_available FROM books WHERE book_id = ?1",
        params![id],
        book_from_row,
    )
    .optional()
    .context("failed to load book")
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        genre: row.get(3)?,
        available: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn new_books_are_listed_as_available() {
        let conn = open_in_memory().unwrap();
        let dune = create_book(&conn, "Dune", "Herbert", "SciFi").unwrap();
        let emma = create_book(&conn, " Emma ", "Austen", "").unwrap();

        assert!(dune.available);
        assert_eq!(emma.title, "Emma");

        let listed = fetch_available_books(&conn).unwrap();
        assert_eq!(listed, vec![dune.clone(), emma]);
        assert_eq!(fetch_book(&conn, dune.id).unwrap(), Some(dune));
    }

    #[test]
    fn unavailable_books_are_not_listed() {
        let conn = open_in_memory().unwrap();
        let dune = create_book(&conn, "Dune", "Herbert", "SciFi").unwrap();
        conn.execute(
            "UPDATE books SET is_available = 0 WHERE book_id = ?1",
            [dune.id],
        )
        .unwrap();

        assert!(fetch_available_books(&conn).unwrap().is_empty());
        assert!(!fetch_book(&conn, dune.id).unwrap().unwrap().available);
    }

    #[test]
    fn title_and_author_are_required() {
        let conn = open_in_memory().unwrap();
        let err = create_book(&conn, "", "Herbert", "SciFi").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::MissingField("Title"))
        );
        let err = create_book(&conn, "Dune", " ", "SciFi").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::MissingField("Author"))
        );
        assert_eq!(fetch_book(&conn, 1).unwrap(), None);
    }
}
