use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection};

use super::error::LibraryError;
use crate::models::{Book, BorrowRecord, Loan, User};

/// Lend `book_id` to `user`. Marking the book unavailable and writing the
/// ledger row happen in one transaction; if either step fails, neither is
/// kept.
pub fn borrow_book(conn: &mut Connection, user: &User, book_id: i64) -> Result<BorrowRecord> {
    let tx = conn
        .transaction()
        .context("failed to start borrow transaction")?;

    let updated = tx
        .execute(
            "UPDATE books SET is_available = 0 WHERE book_id = ?1 AND is_available = 1",
            params![book_id],
        )
        .context("failed to update book availability")?;

    if updated == 0 {
        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM books WHERE book_id = ?1)",
                params![book_id],
                |row| row.get(0),
            )
            .context("failed to look up book")?;
        let err = if exists {
            LibraryError::BookUnavailable(book_id)
        } else {
            LibraryError::BookNotFound(book_id)
        };
        return Err(err.into());
    }

    tx.execute(
        "INSERT INTO borrowed_books (user_id, book_id) VALUES (?1, ?2)",
        params![user.id, book_id],
    )
    .context("failed to record loan")?;

    let id = tx.last_insert_rowid();
    let borrowed_on: NaiveDate = tx
        .query_row(
            "SELECT borrow_date FROM borrowed_books WHERE borrow_id = ?1",
            params![id],
            |row| row.get(0),
        )
        .context("failed to read borrow date")?;

    tx.commit().context("failed to commit borrow")?;
    debug!("user #{} borrowed book #{book_id} (loan #{id})", user.id);

    Ok(BorrowRecord {
        id,
        user_id: user.id,
        book_id,
        borrowed_on,
    })
}

/// Everything `user_id` has borrowed, most recent first.
pub fn fetch_loans_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Loan>> {
    let mut stmt = conn
        .prepare(
            "SELECT bb.borrow_id, bb.user_id, bb.book_id, bb.borrow_date,
                    b.title, b.author, b.genre, b.is_available
             FROM borrowed_books bb
             INNER JOIN books b ON b.book_id = bb.book_id
             WHERE bb.user_id = ?1
             ORDER BY bb.borrow_date DESC, bb.borrow_id DESC",
        )
        .context("failed to prepare loans query")?;

    let loans = stmt
        .query_map(params![user_id], |row| {
            let record = BorrowRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                book_id: row.get(2)?,
                borrowed_on: row.get(3)?,
            };
            Ok(Loan {
                book: Book {
                    id: record.book_id,
                    title: row.get(4)?,
                    author: row.get(5)?,
                    genre: row.get(6)?,
                    available: row.get(7)?,
                },
                record,
            })
        })
        .context("failed to iterate loans")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect loans")?;

    Ok(loans)
}

pub fn count_borrow_records(conn: &Connection, book_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM borrowed_books WHERE book_id = ?1",
        params![book_id],
        |row| row.get(0),
    )
    .context("failed to count borrow records")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_book, fetch_available_books, fetch_book, open_in_memory, register_user};

    #[test]
    fn borrowing_hides_the_book_and_records_one_loan() {
        let mut conn = open_in_memory().unwrap();
        let alice = register_user(&conn, "alice", "pw1").unwrap();
        let dune = create_book(&conn, "Dune", "Herbert", "SciFi").unwrap();
        let emma = create_book(&conn, "Emma", "Austen", "Classic").unwrap();

        let record = borrow_book(&mut conn, &alice, dune.id).unwrap();
        assert_eq!(record.user_id, alice.id);
        assert_eq!(record.book_id, dune.id);

        assert_eq!(fetch_available_books(&conn).unwrap(), vec![emma]);
        assert_eq!(count_borrow_records(&conn, dune.id).unwrap(), 1);

        let loans = fetch_loans_for_user(&conn, alice.id).unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].record, record);
        assert_eq!(loans[0].book.title, "Dune");
        assert!(!loans[0].book.available);
    }

    #[test]
    fn borrowed_book_cannot_be_borrowed_again() {
        let mut conn = open_in_memory().unwrap();
        let alice = register_user(&conn, "alice", "pw1").unwrap();
        let bob = register_user(&conn, "bob", "pw2").unwrap();
        let dune = create_book(&conn, "Dune", "Herbert", "SciFi").unwrap();

        borrow_book(&mut conn, &alice, dune.id).unwrap();
        let err = borrow_book(&mut conn, &bob, dune.id).unwrap_err();

        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::BookUnavailable(dune.id))
        );
        assert_eq!(count_borrow_records(&conn, dune.id).unwrap(), 1);
        assert!(fetch_loans_for_user(&conn, bob.id).unwrap().is_empty());
    }

    #[test]
    fn unknown_book_is_reported() {
        let mut conn = open_in_memory().unwrap();
        let alice = register_user(&conn, "alice", "pw1").unwrap();

        let err = borrow_book(&mut conn, &alice, 99).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::BookNotFound(99))
        );
    }

    #[test]
    fn failed_ledger_insert_rolls_back_availability() {
        let mut conn = open_in_memory().unwrap();
        let dune = create_book(&conn, "Dune", "Herbert", "SciFi").unwrap();
        let ghost = User {
            id: 404,
            username: "ghost".to_string(),
        };

        assert!(borrow_book(&mut conn, &ghost, dune.id).is_err());

        assert!(fetch_book(&conn, dune.id).unwrap().unwrap().available);
        assert_eq!(count_borrow_records(&conn, dune.id).unwrap(), 0);
    }
}
