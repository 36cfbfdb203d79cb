//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 10-19   | credential       | API key / keychain codes                 |
//! | 20-29   | gateway          | Model endpoint codes                     |
//! | 30-39   | host             | Document read/write codes                |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Credential (10-19)
// =============================================================================

/// No API key available (flag, keychain, or environment).
pub const EXIT_MISSING_KEY: u8 = 10;

/// Keychain error (cannot read/write credentials).
pub const EXIT_KEYCHAIN_ERR: u8 = 11;

// =============================================================================
// Gateway (20-29)
// =============================================================================

/// Non-retryable HTTP failure from the model endpoint.
pub const EXIT_GATEWAY_HTTP: u8 = 20;

/// Retries exhausted (404/429 on every attempt).
pub const EXIT_GATEWAY_EXHAUSTED: u8 = 21;

/// The model returned no text.
pub const EXIT_GATEWAY_EMPTY: u8 = 22;

/// Transport failure (DNS, TLS, connection).
pub const EXIT_GATEWAY_NETWORK: u8 = 23;

// =============================================================================
// Host (30-39)
// =============================================================================

/// Document state could not be read.
pub const EXIT_HOST_READ: u8 = 30;

/// A document mutation was rejected.
pub const EXIT_HOST_WRITE: u8 = 31;
