//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// The role given to users that register without one.
pub const DEFAULT_ROLE: &str = "user";

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name to display for the user, if they gave one.
    pub name: Option<String>,
    /// The email the user logs in with. No two users share an email.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's role, e.g. "user".
    pub role: String,
}

/// The data needed to insert a user. The database assigns the ID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The name to display for the user.
    pub name: Option<String>,
    /// The email the user logs in with.
    pub email: String,
    /// The hash of the user's password.
    pub password_hash: PasswordHash,
    /// The user's role. [DEFAULT_ROLE] is used when `None`.
    pub role: Option<String>,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user'
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DuplicateEmail] if a user with the same email already exists,
/// or a [Error::SqlError] if another SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let role = new_user.role.unwrap_or_else(|| DEFAULT_ROLE.to_owned());

    connection.execute(
        "INSERT INTO user (name, email, password, role) VALUES (?1, ?2, ?3, ?4)",
        (
            &new_user.name,
            &new_user.email,
            new_user.password_hash.as_ref(),
            &role,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name: new_user.name,
        email: new_user.email,
        password_hash: new_user.password_hash,
        role,
    })
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user ([Error::UserNotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name, email, password, role FROM user WHERE email = :email")?
        .query_row(&[(":email", email)], map_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))?;

    usize::try_from(count)
        .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, count).into())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let name = row.get(1)?;
    let email = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;
    let role = row.get(4)?;

    Ok(User {
        id: UserID::new(raw_id),
        name,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role,
    })
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        user::{DEFAULT_ROLE, NewUser, count_users, create_user, get_user_by_email},
    };

    use super::{Error, create_user_table};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: Some("Alice".to_owned()),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            role: None,
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("a@x.com"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "a@x.com");
        assert_eq!(inserted_user.name.as_deref(), Some("Alice"));
        assert_eq!(
            inserted_user.password_hash,
            PasswordHash::new_unchecked("hunter2")
        );
    }

    #[test]
    fn insert_user_defaults_role() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("a@x.com"), &db_connection).unwrap();

        assert_eq!(inserted_user.role, DEFAULT_ROLE);
    }

    #[test]
    fn insert_user_keeps_given_role() {
        let db_connection = get_db_connection();
        let user = NewUser {
            role: Some("admin".to_owned()),
            ..new_user("a@x.com")
        };

        create_user(user, &db_connection).unwrap();
        let retrieved_user = get_user_by_email("a@x.com", &db_connection).unwrap();

        assert_eq!(retrieved_user.role, "admin");
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let db_connection = get_db_connection();
        create_user(new_user("a@x.com"), &db_connection).unwrap();

        let duplicate = NewUser {
            name: Some("Bob".to_owned()),
            password_hash: PasswordHash::new_unchecked("hunter3"),
            ..new_user("a@x.com")
        };

        assert_eq!(
            create_user(duplicate, &db_connection),
            Err(Error::DuplicateEmail)
        );
        assert_eq!(count_users(&db_connection), Ok(1));
    }

    #[test]
    fn insert_user_without_name_succeeds() {
        let db_connection = get_db_connection();
        let user = NewUser {
            name: None,
            ..new_user("a@x.com")
        };

        create_user(user, &db_connection).unwrap();
        let retrieved_user = get_user_by_email("a@x.com", &db_connection).unwrap();

        assert_eq!(retrieved_user.name, None);
    }

    #[test]
    fn get_user_fails_with_unknown_email() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_email("nobody@x.com", &db_connection),
            Err(Error::UserNotFound)
        );
    }

    #[test]
    fn get_user_succeeds_with_existing_email() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("a@x.com"), &db_connection).unwrap();

        let retrieved_user = get_user_by_email("a@x.com", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn count_users_counts_every_user() {
        let db_connection = get_db_connection();

        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            create_user(new_user(email), &db_connection).unwrap();
        }

        assert_eq!(count_users(&db_connection), Ok(3));
    }

    #[test]
    fn returns_correct_count() {
        let db_connection = get_db_connection();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(0, count, "Want zero users before insertion, got {count}");

        create_user(new_user("a@x.com"), &db_connection).unwrap();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(1, count, "Want one user after insertion, got {count}");
    }
}
