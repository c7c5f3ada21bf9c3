use anyhow::{Context, Result};
use log::{debug, warn};
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand_core::OsRng;
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension};

use super::error::LibraryError;
use crate::models::User;

/// Create a new account. The password is stored as a salted PBKDF2 hash.
pub fn register_user(conn: &Connection, username: &str, password: &str) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LibraryError::MissingField("Username").into());
    }
    if password.is_empty() {
        return Err(LibraryError::MissingField("Password").into());
    }

    let password_hash = hash_password(password)?;
    conn.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )
    .map_err(|err| map_unique_constraint(err, username))
    .context("failed to insert user")?;

    let id = conn.last_insert_rowid();
    debug!("registered user {username} as #{id}");
    Ok(User {
        id,
        username: username.to_string(),
    })
}

/// Look up `username` and check `password` against the stored hash. Unknown
/// users and wrong passwords produce the same error.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<User> {
    let username = username.trim();
    let row = conn
        .query_row(
            "SELECT user_id, username, password_hash FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok((
                    User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    },
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
        .context("failed to look up user")?;

    let Some((user, stored_hash)) = row else {
        warn!("login attempt for unknown user {username}");
        return Err(LibraryError::InvalidCredentials.into());
    };

    if !verify_password(password, &stored_hash)? {
        warn!("wrong password for user {username}");
        return Err(LibraryError::InvalidCredentials.into());
    }

    Ok(user)
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| LibraryError::PasswordHash(err.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let hash =
        PasswordHash::new(stored_hash).map_err(|err| LibraryError::PasswordHash(err.to_string()))?;
    Ok(Pbkdf2.verify_password(password.as_bytes(), &hash).is_ok())
}

/// The only constraint on `users` is the unique username.
fn map_unique_constraint(err: SqlError, username: &str) -> anyhow::Error {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        LibraryError::DuplicateUsername(username.to_string()).into()
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn count_named(conn: &Connection, username: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1",
            [username],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn duplicate_username_is_rejected_and_leaves_one_row() {
        let conn = open_in_memory().unwrap();

        let first = register_user(&conn, "alice", "pw1").unwrap();
        assert_eq!(first.username, "alice");

        let err = register_user(&conn, "alice", "other").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::DuplicateUsername("alice".to_string()))
        );
        assert_eq!(count_named(&conn, "alice"), 1);
    }

    #[test]
    fn blank_fields_never_reach_the_database() {
        let conn = open_in_memory().unwrap();

        let err = register_user(&conn, "   ", "pw").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::MissingField("Username"))
        );
        let err = register_user(&conn, "bob", "").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::MissingField("Password"))
        );

        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn stored_password_is_hashed() {
        let conn = open_in_memory().unwrap();
        register_user(&conn, "alice", "pw1").unwrap();

        let stored: String = conn
            .query_row(
                "SELECT password_hash FROM users WHERE username = 'alice'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_ne!(stored, "pw1");
        assert!(stored.starts_with("$pbkdf2"));
    }

    #[test]
    fn authenticate_checks_the_password() {
        let conn = open_in_memory().unwrap();
        let registered = register_user(&conn, "alice", "pw1").unwrap();

        let user = authenticate(&conn, "alice", "pw1").unwrap();
        assert_eq!(user, registered);

        for (name, password) in [("alice", "wrong"), ("mallory", "pw1")] {
            let err = authenticate(&conn, name, password).unwrap_err();
            assert_eq!(
                err.downcast_ref::<LibraryError>(),
                Some(&LibraryError::InvalidCredentials)
            );
        }
    }
}
