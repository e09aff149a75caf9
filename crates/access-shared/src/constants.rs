//! Application-wide constants

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CATALOG_PATH: &str = "/api/menus/";
pub const DEFAULT_ASSIGNMENT_PATH: &str = "/api/users/{user_id}/menus/";
pub const DEFAULT_REFRESH_PATH: &str = "/api/token/refresh/";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Placeholder substituted with the user id in the assignment path.
pub const USER_ID_PLACEHOLDER: &str = "{user_id}";

/// Path value marking a grouping node that cannot be navigated to.
pub const NON_NAVIGABLE_PATH: &str = "#";

/// `token_type` claim of short-lived credentials.
pub const TOKEN_TYPE_ACCESS: &str = "access";
