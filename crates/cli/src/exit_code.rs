//! Process exit codes
//!
//! Only fatal startup problems produce a non-zero code. A walkthrough whose
//! steps fail still exits with `Success`; the failures are in the trace.

/// Exit codes for the bucketwalk binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// Client construction or I/O failure
    GeneralError = 1,

    /// Invalid configuration or arguments
    UsageError = 2,

    /// The config file already exists
    Conflict = 6,

    /// Interrupted by Ctrl+C
    Interrupted = 130,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code matching a fatal bw-core error
    pub const fn from_error(err: &bw_core::Error) -> Self {
        match err.exit_code() {
            2 => Self::UsageError,
            6 => Self::Conflict,
            _ => Self::GeneralError,
        }
    }
}
