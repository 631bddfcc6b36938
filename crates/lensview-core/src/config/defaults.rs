//! Default values for lensview configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Graph Database Defaults
// ============================================================================

/// Default Dgraph alpha HTTP endpoint.
pub const DEFAULT_ALPHA: &str = "http://localhost:8080";

/// Default request timeout for graph database queries (seconds).
pub const DEFAULT_DGRAPH_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Display Defaults
// ============================================================================

/// Default display attribute per built-in entity type.
pub const DEFAULT_DISPLAY_PROPERTIES: &[(&str, &str)] = &[
    ("Process", "process_name"),
    ("File", "file_path"),
    ("IpAddress", "ip_address"),
    ("Asset", "hostname"),
    ("Risk", "analyzer_name"),
    ("IpConnections", "dst_ip_addr"),
    ("ProcessInboundConnections", "ip_address"),
    ("ProcessOutboundConnections", "ip_address"),
];

// ============================================================================
// API Defaults
// ============================================================================

/// Largest page accepted by the lens listing.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

// ============================================================================
// Poll Defaults
// ============================================================================

/// Default poll interval (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default resolver server the watcher polls.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3333";

/// Default request timeout for the watcher (seconds).
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Serve Defaults
// ============================================================================

/// Default bind address of the resolver server.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default port of the resolver server.
pub const DEFAULT_PORT: u16 = 3333;

// ============================================================================
// Config Files
// ============================================================================

/// Project-local config file name.
pub const CONFIG_FILE_NAME: &str = "lensview.toml";

/// Directory under the user config dir.
pub const CONFIG_DIR_NAME: &str = "lensview";
