//! Shared constants for portico

/// Session-store key under which the marshaled auth session blob lives.
pub const SESSION_VALUE_KEY: &str = "auth.session";

/// Name of the browser cookie carrying the session id.
pub const SESSION_COOKIE_NAME: &str = "portico_session";

/// Query parameter carrying the OAuth state token.
pub const STATE_PARAM: &str = "state";

// Default OAuth adaptor configuration.
pub const DEFAULT_REQUEST_PATH: &str = "/oauth/{provider}";
pub const DEFAULT_REQUEST_PATH_PARAM: &str = "provider";
pub const DEFAULT_CALLBACK_RELATIVE_PATH: &str = "/callback";
pub const DEFAULT_ROUTE_NAME: &str = "oauth";

/// How long a login session may sit between begin and callback.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Interval for the expired-session sweep.
pub const SESSION_CLEANUP_INTERVAL_SECS: u64 = 300;
