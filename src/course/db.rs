//! Database operations for courses.

use rusqlite::{Connection, Row};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    course::{Course, CourseID, NewCourse},
};

/// Insert a course and return it with its generated ID and creation time.
///
/// # Errors
///
/// Returns [Error::MissingCourseLink] if `new_course` has no link (or a blank one),
/// or a [Error::SqlError] if an SQL related error occurred.
pub fn create_course(new_course: NewCourse, connection: &Connection) -> Result<Course, Error> {
    let link = match new_course.link {
        Some(link) if !link.trim().is_empty() => link,
        _ => return Err(Error::MissingCourseLink),
    };
    let created_at = now_millis();

    connection.execute(
        "INSERT INTO course (title, description, category, content_path, link, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            &new_course.title,
            &new_course.description,
            &new_course.category,
            &new_course.content_path,
            &link,
            created_at,
        ),
    )?;

    let id = CourseID::new(connection.last_insert_rowid());

    Ok(Course {
        id,
        title: new_course.title,
        description: new_course.description,
        category: new_course.category,
        content_path: new_course.content_path,
        link,
        created_at,
    })
}

/// Retrieve every course in the order the database returns them.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_all_courses(connection: &Connection) -> Result<Vec<Course>, Error> {
    connection
        .prepare(
            "SELECT id, title, description, category, content_path, link, created_at FROM course;",
        )?
        .query_map([], map_row)?
        .map(|maybe_course| maybe_course.map_err(|error| error.into()))
        .collect()
}

/// Initialize the course table.
pub fn create_course_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS course (
            id INTEGER PRIMARY KEY,
            title TEXT,
            description TEXT,
            category TEXT,
            content_path TEXT,
            link TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// The current time truncated to whole milliseconds.
fn now_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let sub_millis = i64::from(now.nanosecond() % 1_000_000);

    now - Duration::nanoseconds(sub_millis)
}

fn map_row(row: &Row) -> Result<Course, rusqlite::Error> {
    Ok(Course {
        id: CourseID::new(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        content_path: row.get(4)?,
        link: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod course_query_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        course::{NewCourse, create_course, get_all_courses},
    };

    use super::create_course_table;

    fn get_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_course_table(&connection).unwrap();
        connection
    }

    fn rust_course() -> NewCourse {
        NewCourse {
            title: Some("Rust".to_owned()),
            description: Some("Learn Rust".to_owned()),
            category: Some("Programming".to_owned()),
            content_path: None,
            link: Some("https://example.com/rust".to_owned()),
        }
    }

    #[test]
    fn create_course_succeeds() {
        let connection = get_db_connection();
        let before = OffsetDateTime::now_utc() - Duration::seconds(1);

        let course = create_course(rust_course(), &connection).unwrap();

        assert!(course.id.as_i64() > 0);
        assert_eq!(course.title.as_deref(), Some("Rust"));
        assert_eq!(course.link, "https://example.com/rust");
        assert!(course.created_at >= before);
        assert_eq!(course.created_at.nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn create_course_fails_without_link() {
        let connection = get_db_connection();
        let new_course = NewCourse {
            link: None,
            ..rust_course()
        };

        let result = create_course(new_course, &connection);

        assert_eq!(result, Err(Error::MissingCourseLink));
        assert_eq!(get_all_courses(&connection), Ok(vec![]));
    }

    #[test]
    fn create_course_fails_with_blank_link() {
        let connection = get_db_connection();
        let new_course = NewCourse {
            link: Some("  ".to_owned()),
            ..rust_course()
        };

        assert_eq!(
            create_course(new_course, &connection),
            Err(Error::MissingCourseLink)
        );
    }

    #[test]
    fn create_course_with_only_link_succeeds() {
        let connection = get_db_connection();
        let new_course = NewCourse {
            link: Some("http://x".to_owned()),
            ..Default::default()
        };

        let course = create_course(new_course, &connection).unwrap();

        assert_eq!(course.title, None);
        assert_eq!(course.link, "http://x");
    }

    #[test]
    fn get_all_courses_is_empty_for_new_database() {
        let connection = get_db_connection();

        assert_eq!(get_all_courses(&connection), Ok(vec![]));
    }

    #[test]
    fn created_courses_are_listed() {
        let connection = get_db_connection();
        let rust = create_course(rust_course(), &connection).unwrap();
        let go = create_course(
            NewCourse {
                title: Some("Go".to_owned()),
                link: Some("https://example.com/go".to_owned()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        let courses = get_all_courses(&connection).unwrap();

        assert_eq!(courses.len(), 2, "want 2 courses, got {courses:?}");
        for want in [rust, go] {
            let got = courses
                .iter()
                .find(|course| course.id == want.id)
                .unwrap_or_else(|| panic!("course {} missing from {courses:?}", want.id));
            assert_eq!(got.title, want.title);
            assert_eq!(got.description, want.description);
            assert_eq!(got.category, want.category);
            assert_eq!(got.content_path, want.content_path);
            assert_eq!(got.link, want.link);
            assert_eq!(got.created_at.unix_timestamp(), want.created_at.unix_timestamp());
        }
    }
}
