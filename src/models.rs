//! Domain models shared by the roster editor and the library manager. They are
//! plain data holders; persistence lives in `db` and mutation rules for the
//! roster live in `roster`.

use std::fmt;

use chrono::NaiveDate;

/// A single roster entry. Nothing about the identifier is enforced: two
/// students may share an id and any of the fields may be blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub age: i64,
}

/// A registered library member. The password hash stays in the database and
/// never travels with the struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Primary key from the `users` table.
    pub id: i64,
    pub username: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A catalog entry. `available` flips to false once the book is borrowed and
/// there is no workflow that flips it back.
pub struct Book {
    /// Primary key from the `books` table. The borrow flow hands this id to
    /// the ledger directly instead of recovering it from the listing label.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub available: bool,
}

impl Book {
    /// Text shown for each row of the available-books list.
    pub fn listing_label(&self) -> String {
        format!(
            "ID: {} - {} by {} ({})",
            self.id, self.title, self.author, self.genre
        )
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.listing_label())
    }
}

/// One row of the lending ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowRecord {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    /// Filled in by SQLite's `CURRENT_DATE` default.
    pub borrowed_on: NaiveDate,
}

/// A borrow record joined with the book it refers to, for the "my loans" view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub record: BorrowRecord,
    pub book: Book,
}

impl Loan {
    pub fn display_line(&self) -> String {
        format!(
            "{} - {} by {}",
            self.record.borrowed_on.format("%Y-%m-%d"),
            self.book.title,
            self.book.author
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_label_matches_catalog_format() {
        let book = Book {
            id: 7,
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            genre: "SciFi".to_string(),
            available: true,
        };
        assert_eq!(book.listing_label(), "ID: 7 - Dune by Herbert (SciFi)");
        assert_eq!(book.to_string(), book.listing_label());
    }

    #[test]
    fn loan_line_leads_with_the_borrow_date() {
        let loan = Loan {
            record: BorrowRecord {
                id: 1,
                user_id: 2,
                book_id: 3,
                borrowed_on: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            },
            book: Book {
                id: 3,
                title: "Emma".to_string(),
                author: "Austen".to_string(),
                genre: "Classic".to_string(),
                available: false,
            },
        };
        assert_eq!(loan.display_line(), "2024-03-09 - Emma by Austen");
    }
}
