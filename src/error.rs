//! Error Module - Allocator Error Types
//!
//! Defines the error taxonomy for `mfalloc` and the fatal/recoverable split:
//! out-of-memory surfaces as `None`/`Err` to the caller, everything else
//! indicates a broken invariant and terminates the process with a distinct
//! exit code.

use std::sync::PoisonError;
use thiserror::Error;

/// Exit codes used by [`AllocError::fatal`], one per fatal error kind, so a
/// crashed process's exit status identifies which invariant was violated
/// without parsing stderr.
mod exit_code {
    pub const USE_BEFORE_INIT: i32 = 2;
    pub const DOUBLE_FREE: i32 = 3;
    pub const REALLOC_OF_FREED: i32 = 4;
    pub const INVALID_POINTER: i32 = 5;
    pub const OS_PRIMITIVE_FAILURE: i32 = 6;
    pub const LOCK_POISONED: i32 = 7;
    pub const CONFIGURATION: i32 = 8;
}

/// Main error type for all `mfalloc` operations.
#[derive(Debug, Error)]
pub enum AllocError {
    #[error("out of memory: requested {requested} bytes, mapping failed")]
    OutOfMemory { requested: usize },

    #[error("allocator used before init() was called")]
    UseBeforeInit,

    #[error("double free detected at address {address:#x}")]
    DoubleFree { address: usize },

    #[error("reallocate called on a block already freed at address {address:#x}")]
    ReallocOfFreed { address: usize },

    #[error("invalid pointer {address:#x}: {reason}")]
    InvalidPointer { address: usize, reason: String },

    #[error("OS primitive failed: {operation}: {reason}")]
    OsPrimitiveFailure { operation: String, reason: String },

    #[error("allocator mutex poisoned: {0}")]
    LockPoisoned(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl AllocError {
    /// Whether this error kind terminates the process (see design §7).
    ///
    /// Only [`AllocError::OutOfMemory`] is recoverable; every other variant
    /// means the caller (or the host OS) broke an allocator invariant.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AllocError::OutOfMemory { .. })
    }

    fn exit_code(&self) -> i32 {
        match self {
            AllocError::OutOfMemory { .. } => 0,
            AllocError::UseBeforeInit => exit_code::USE_BEFORE_INIT,
            AllocError::DoubleFree { .. } => exit_code::DOUBLE_FREE,
            AllocError::ReallocOfFreed { .. } => exit_code::REALLOC_OF_FREED,
            AllocError::InvalidPointer { .. } => exit_code::INVALID_POINTER,
            AllocError::OsPrimitiveFailure { .. } => exit_code::OS_PRIMITIVE_FAILURE,
            AllocError::LockPoisoned(_) => exit_code::LOCK_POISONED,
            AllocError::Configuration(_) => exit_code::CONFIGURATION,
        }
    }

    /// Log the diagnostic and terminate the process with this error's exit
    /// code. Never returns.
    ///
    /// Only called for errors where [`is_fatal`](Self::is_fatal) holds; the
    /// allocator's invariants are presumed irrecoverable once violated, so
    /// there is no path back to the caller.
    pub fn fatal(self) -> ! {
        log::error!("mfalloc: fatal error: {self}");
        std::process::exit(self.exit_code());
    }
}

impl<T> From<PoisonError<T>> for AllocError {
    fn from(err: PoisonError<T>) -> Self {
        AllocError::LockPoisoned(err.to_string())
    }
}

/// Result type alias for `mfalloc` operations.
pub type Result<T> = std::result::Result<T, AllocError>;

/// Ensure a condition holds, otherwise return the given error.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_is_not_fatal() {
        let e = AllocError::OutOfMemory { requested: 1024 };
        assert!(!e.is_fatal());
    }

    #[test]
    fn double_free_is_fatal_with_distinct_code() {
        let e = AllocError::DoubleFree { address: 0x1000 };
        assert!(e.is_fatal());
        assert_eq!(e.exit_code(), exit_code::DOUBLE_FREE);
        assert_ne!(e.exit_code(), exit_code::REALLOC_OF_FREED);
    }

    #[test]
    fn lock_poisoned_preserves_message() {
        let err = AllocError::LockPoisoned("poisoned".to_string());
        assert!(matches!(err, AllocError::LockPoisoned(ref s) if s == "poisoned"));
    }
}
