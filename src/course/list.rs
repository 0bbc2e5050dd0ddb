//! The endpoint for listing the course catalog.

use axum::{Json, extract::State};

use crate::{
    Error,
    course::{Course, CourseState, get_all_courses},
};

/// Handler for listing every course via the GET method.
///
/// The order of the returned courses is not specified.
///
/// # Errors
///
/// Returns [Error::FetchCoursesFailed] (500) if the courses could not be read.
pub async fn get_courses_endpoint(
    State(state): State<CourseState>,
) -> Result<Json<Vec<Course>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::FetchCoursesFailed
    })?;

    get_all_courses(&connection).map(Json).map_err(|error| {
        tracing::error!("Could not fetch courses: {error}");
        Error::FetchCoursesFailed
    })
}
