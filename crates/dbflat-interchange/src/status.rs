//! Failure categories and their process exit codes

/// Broad class of a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad arguments, unknown variant, unreadable configuration
    Configuration,
    /// Target table missing or unusable
    Schema,
    /// File or stream failure
    Io,
    /// Query or statement failure inside the database
    Execution,
    /// Stopped by the user
    Cancelled,
}

impl ErrorCategory {
    /// Exit status reported by the command-line front end
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Schema => 3,
            ErrorCategory::Io => 4,
            ErrorCategory::Execution => 5,
            ErrorCategory::Cancelled => 130,
        }
    }
}
