//! Shared constants for end-to-end tests

// ============================================================================
// Test User Credentials
// ============================================================================

/// User created by every `TestServer`
pub const TEST_USER: &str = "testuser";

pub const TEST_PASS: &str = "testpass123";

// ============================================================================
// Auth Configuration
// ============================================================================

pub const TEST_JWT_SECRET: &str = "test-access-secret";

pub const TEST_JWT_REFRESH_SECRET: &str = "test-refresh-secret";

/// Small argon2 memory cost so that hashing does not dominate test time
pub const TEST_HASH_MEMORY_KIB: u32 = 1024;

// ============================================================================
// Identifiers
// ============================================================================

/// Well-formed, but never assigned to any record
pub const UNKNOWN_ID: &str = "00000000-0000-4000-8000-000000000000";

pub const MALFORMED_ID: &str = "not-a-uuid";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
