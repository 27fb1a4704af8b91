//! Configuration Module - Allocator Tuning Parameters
//!
//! Manages the parameters controlling region growth, synchronization
//! discipline, and validation strictness for a pool.

/// Size of a block header, in bytes, as laid out in-band at the front of
/// every block (see [`crate::heap::block`]).
pub const HEADER_SIZE: usize = std::mem::size_of::<crate::heap::block::BlockHeader>();

/// Size of a region header, in bytes (see [`crate::heap::region`]).
pub const REGION_HEADER_SIZE: usize = std::mem::size_of::<crate::heap::region::RegionHeader>();

/// Default region size (256 MiB), matching the pool size used throughout
/// the boundary scenarios in the design (S1-S7).
pub const DEFAULT_REGION_SIZE: usize = 256 * 1024 * 1024;

/// Which synchronization discipline `mfalloc::init` wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMode {
    /// A single allocator state guarded by one mutex, shared by every
    /// thread in the process.
    Global,
    /// Allocator state with thread-local storage duration; no locking.
    /// Each thread must `init` before its first allocation.
    PerThread,
}

/// Configuration for an `mfalloc` pool.
///
/// Most fields have sensible defaults; construct with
/// `AllocatorConfig { region_size: ..., ..Default::default() }` to override
/// only what matters for a given deployment.
///
/// # Examples
///
/// ```
/// use mfalloc::config::AllocatorConfig;
///
/// let config = AllocatorConfig::default();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Default region size in bytes. Rounded up to the system page size.
    /// New regions grow to fit a request that doesn't fit this default.
    ///
    /// Default: 256 MiB.
    pub region_size: usize,

    /// Whether `init` eagerly maps the first region, or defers mapping
    /// until the first allocation that needs it (lazy).
    ///
    /// Default: `false` (lazy).
    pub eager: bool,

    /// Which synchronization discipline guards the pool.
    ///
    /// Default: [`PoolMode::Global`].
    pub pool_mode: PoolMode,

    /// Enable best-effort structural validation of block headers on every
    /// `free`/`reallocate` entry point before trusting them.
    ///
    /// Default: `false`.
    pub validate_blocks: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig {
            region_size: DEFAULT_REGION_SIZE,
            eager: false,
            pool_mode: PoolMode::Global,
            validate_blocks: false,
        }
    }
}

impl AllocatorConfig {
    /// Validate configuration.
    ///
    /// Checks that `region_size` is large enough to hold at least one
    /// region header, one block header, and one byte of payload.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region_size == 0 {
            return Err(ConfigError::InvalidRegionSize(
                "region_size must be > 0".to_string(),
            ));
        }

        let minimum = REGION_HEADER_SIZE + HEADER_SIZE + 1;
        if self.region_size < minimum {
            return Err(ConfigError::InvalidRegionSize(format!(
                "region_size must be at least {minimum} bytes (region header + block header + 1 byte)"
            )));
        }

        Ok(())
    }

    /// Build configuration from environment variables, overriding defaults:
    /// - `MFALLOC_REGION_SIZE`
    /// - `MFALLOC_EAGER`
    /// - `MFALLOC_PER_THREAD`
    /// - `MFALLOC_VALIDATE_BLOCKS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MFALLOC_REGION_SIZE") {
            if let Ok(size) = val.parse::<usize>() {
                config.region_size = size;
            }
        }

        if let Ok(val) = std::env::var("MFALLOC_EAGER") {
            config.eager = val == "1" || val.eq_ignore_ascii_case("true");
        }

        if let Ok(val) = std::env::var("MFALLOC_PER_THREAD") {
            if val == "1" || val.eq_ignore_ascii_case("true") {
                config.pool_mode = PoolMode::PerThread;
            }
        }

        if let Ok(val) = std::env::var("MFALLOC_VALIDATE_BLOCKS") {
            config.validate_blocks = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Error types for configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid region size: {0}")]
    InvalidRegionSize(String),
}
