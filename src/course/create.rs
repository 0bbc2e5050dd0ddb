//! The endpoint for adding a course to the catalog.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::{
    Error, JsonOrForm,
    course::{CourseState, NewCourse, create_course},
};

/// Handler for adding a course via the POST method.
///
/// Responds with 201 and a confirmation message once the course is stored.
///
/// # Errors
///
/// - [Error::MissingCourseLink] (400) if the body has no `link`.
/// - [Error::InvalidRequestBody] (400) if the body is neither a JSON object nor form data.
/// - [Error::AddCourseFailed] (500) if the course could not be stored.
pub async fn create_course_endpoint(
    State(state): State<CourseState>,
    JsonOrForm(new_course): JsonOrForm<NewCourse>,
) -> Result<(StatusCode, Json<Value>), Error> {

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::AddCourseFailed
    })?;

    match create_course(new_course, &connection) {
        Ok(course) => {
            tracing::info!("Added course {} ({})", course.id, course.link);

            Ok((
                StatusCode::CREATED,
                Json(json!({ "message": "Course added successfully" })),
            ))
        }
        Err(Error::MissingCourseLink) => Err(Error::MissingCourseLink),
        Err(error) => {
            tracing::error!("Could not add course: {error}");

            Err(Error::AddCourseFailed)
        }
    }
}

#[cfg(test)]
mod create_course_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        course::{CourseState, create_course_table, get_all_courses},
        endpoints,
    };

    use super::create_course_endpoint;

    fn get_test_state() -> CourseState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_course_table(&connection).expect("Could not create course table");

        CourseState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn get_test_server(state: CourseState) -> TestServer {
        let app = Router::new()
            .route(endpoints::COURSES, post(create_course_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn create_course_succeeds() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::COURSES)
            .json(&json!({
                "title": "T",
                "description": "A course",
                "category": "Testing",
                "contentPath": "/content/t",
                "link": "http://x",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.assert_json(&json!({ "message": "Course added successfully" }));

        let courses = get_all_courses(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].title.as_deref(), Some("T"));
        assert_eq!(courses[0].content_path.as_deref(), Some("/content/t"));
    }

    #[tokio::test]
    async fn create_course_with_form_data_succeeds() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::COURSES)
            .form(&[
                ("title", "T"),
                ("contentPath", "/content/t"),
                ("link", "http://x"),
            ])
            .await;

        response.assert_status(StatusCode::CREATED);
        let courses = get_all_courses(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].title.as_deref(), Some("T"));
        assert_eq!(courses[0].content_path.as_deref(), Some("/content/t"));
        assert_eq!(courses[0].link, "http://x");
    }

    #[tokio::test]
    async fn create_course_with_form_data_fails_without_link() {
        let server = get_test_server(get_test_state());

        server
            .post(endpoints::COURSES)
            .form(&[("title", "T")])
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_course_fails_without_link() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::COURSES)
            .json(&json!({ "title": "T" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["error"].is_string(), "want an error message, got {body}");

        let courses = get_all_courses(&state.db_connection.lock().unwrap()).unwrap();
        assert!(courses.is_empty(), "want no courses, got {courses:?}");
    }

    #[tokio::test]
    async fn create_course_fails_with_malformed_json() {
        let server = get_test_server(get_test_state());

        server
            .post(endpoints::COURSES)
            .content_type("application/json")
            .text("{\"title\": ")
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_course_reports_store_failure() {
        let connection = Connection::open_in_memory().unwrap();
        // No course table, so the insert fails.
        let state = CourseState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let server = get_test_server(state);

        let response = server
            .post(endpoints::COURSES)
            .json(&json!({ "title": "T", "link": "http://x" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({ "error": "Error adding course" }));
    }
}
