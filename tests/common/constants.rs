//! Shared constants for end-to-end tests

// ============================================================================
// Identity
// ============================================================================

/// HS256 secret shared between the test server and the token minting helper
pub const IDENTITY_SECRET: &str = "e2e-identity-secret";

pub const IDENTITY_ISSUER: &str = "https://id.example.com";

pub const IDENTITY_AUDIENCE: &str = "modelhub";

/// Regular test user
pub const TEST_USER_ID: &str = "user-ayse";

/// Another regular user, used to check cross-user access
pub const OTHER_USER_ID: &str = "user-mehmet";

/// Listed in the server's admin allowlist
pub const ADMIN_USER_ID: &str = "admin-1";

// ============================================================================
// Test Catalog
// ============================================================================

/// Chat, rating 4.5, usage 300, elderly friendly
pub const CHAT_MODEL_ID: u64 = 1;

/// Translation, rating 4.8, usage 50, child and elderly friendly
pub const TRANSLATION_MODEL_ID: u64 = 2;

/// Code, rating 4.2, usage 200
pub const CODE_MODEL_ID: u64 = 3;

/// Image generation, rating 4.9, usage 120, child friendly
pub const IMAGE_MODEL_ID: u64 = 4;

/// Chat, rating 4.0, usage 10, child friendly
pub const TUTOR_MODEL_ID: u64 = 5;

/// Chat, inactive
pub const INACTIVE_MODEL_ID: u64 = 6;

pub const ACTIVE_MODEL_COUNT: usize = 5;

pub const CHAT_MODEL_USAGE: u64 = 300;

pub const TRANSLATION_MODEL_USAGE: u64 = 50;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
