//! Core course domain types.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, CredentialHasher};

/// Database identifier for a course.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseID(i64);

impl CourseID {
    /// Create a new course ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the course ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for CourseID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A course in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// The course's ID in the application database.
    pub id: CourseID,
    /// The course title.
    pub title: Option<String>,
    /// A description of what the course covers.
    pub description: Option<String>,
    /// The category the course is listed under.
    pub category: Option<String>,
    /// Where the course content is stored, if it is hosted locally.
    pub content_path: Option<String>,
    /// The URL of the course content.
    pub link: String,
    /// When the course was added to the catalog.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The fields a client sends to add a course.
///
/// Every field is optional at the parsing stage so that a missing `link` can be
/// reported as a validation error instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    /// The course title.
    pub title: Option<String>,
    /// A description of what the course covers.
    pub description: Option<String>,
    /// The category the course is listed under.
    pub category: Option<String>,
    /// Where the course content is stored.
    pub content_path: Option<String>,
    /// The URL of the course content. Required.
    pub link: Option<String>,
}

/// The state needed to list or add courses.
#[derive(Debug, Clone)]
pub struct CourseState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl<H> FromRef<AppState<H>> for CourseState
where
    H: CredentialHasher,
{
    fn from_ref(state: &AppState<H>) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
