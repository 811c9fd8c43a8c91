//! Exit codes for comment-wrapper
//!
//! These exit codes allow users and CI/CD systems to distinguish between
//! "comments would be reflowed" and a genuine failure.

/// Success - Nothing to do, or all files were reflowed
pub const SUCCESS: i32 = 0;

/// `--check` found files whose comments would be reflowed
pub const CHANGES_NEEDED: i32 = 1;

/// Tool error - Configuration error, file access error, or internal error
pub const TOOL_ERROR: i32 = 2;

/// Helper functions for consistent exit behavior
pub mod exit {
    use super::{CHANGES_NEEDED, TOOL_ERROR};

    /// Exit with changes needed code (1)
    pub fn changes_needed() -> ! {
        std::process::exit(CHANGES_NEEDED);
    }

    /// Exit with tool error code (2)
    pub fn tool_error() -> ! {
        std::process::exit(TOOL_ERROR);
    }
}
