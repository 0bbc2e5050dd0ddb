//! The course catalog: storing courses and the endpoints for listing and adding them.

mod create;
mod db;
mod domain;
mod list;

pub use create::create_course_endpoint;
pub use db::{create_course, create_course_table, get_all_courses};
pub use domain::{Course, CourseID, CourseState, NewCourse};
pub use list::get_courses_endpoint;
