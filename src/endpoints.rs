//! The API endpoints URIs.

/// The root route which reports that the server is up.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const REGISTER: &str = "/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/login";
/// The route to list and create courses.
pub const COURSES: &str = "/courses";
