/*! This module sets up the application's database. */

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, course::create_course_table, user::create_user_table};

/// Create the tables for the domain models if they do not already exist.
///
/// # Errors
///
/// Returns a [Error::SqlError] if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_course_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
