//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, catalog IDs, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Customer handle, holds the Regular role
pub const TEST_USER: &str = "testuser";

pub const TEST_PASS: &str = "testpass123";

/// Store owner handle, holds the Admin role
pub const ADMIN_USER: &str = "admin";

pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Test Catalog
// ============================================================================

pub const ARTIST_1_NAME: &str = "Ansel";
pub const ARTIST_1_FRIENDLY_NAME: &str = "Ansel Adams";
pub const ARTIST_2_NAME: &str = "Dorothea";

/// "Moonrise" by Ansel
pub const CAPTURE_1_ID: i64 = 1;
pub const CAPTURE_1_NAME: &str = "Moonrise";

/// "Half Dome" by Ansel
pub const CAPTURE_2_ID: i64 = 2;
pub const CAPTURE_2_NAME: &str = "Half Dome";

/// "Migrant Mother" by Dorothea
pub const CAPTURE_3_ID: i64 = 3;
pub const CAPTURE_3_NAME: &str = "Migrant Mother";

/// "aurora", no artist
pub const CAPTURE_4_ID: i64 = 4;
pub const CAPTURE_4_NAME: &str = "aurora";

/// An id no capture has
pub const MISSING_CAPTURE_ID: i64 = 999;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
