//! Configuration for metrics resolution.

use std::env;
use std::path::PathBuf;

/// Environment variable holding extra CMap resource directories.
pub const CMAP_PATH_ENV: &str = "CID_METRICS_CMAP_PATH";

/// Default cap on the number of entries a single range may expand to.
///
/// Adobe's UTF-16 CMaps never exceed a few hundred code points per
/// `cidrange` line; anything near this limit is a damaged resource.
pub const DEFAULT_MAX_RANGE_LEN: u32 = 0x1_0000;

/// Metrics resolution configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Maximum entries one CMap range line or one width range may cover.
    pub max_range_len: u32,

    /// Reuse decoded CMaps through the global cache. Off by default; a map is
    /// only shared between fonts holding the same source instance.
    pub share_cmaps: bool,

    /// Directories searched for CMap resources, in order.
    pub cmap_dirs: Vec<PathBuf>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            max_range_len: DEFAULT_MAX_RANGE_LEN,
            share_cmaps: false,
            cmap_dirs: Vec::new(),
        }
    }

    /// Create configuration with defaults plus directories from
    /// `CID_METRICS_CMAP_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(paths) = env::var_os(CMAP_PATH_ENV) {
            config.cmap_dirs.extend(env::split_paths(&paths));
            log::debug!("CMap search path from environment: {:?}", config.cmap_dirs);
        }
        config
    }

    /// Set the range expansion cap.
    pub fn with_max_range_len(mut self, max: u32) -> Self {
        self.max_range_len = max;
        self
    }

    /// Enable or disable the shared CMap cache.
    pub fn with_shared_cmaps(mut self, enable: bool) -> Self {
        self.share_cmaps = enable;
        self
    }

    /// Append a CMap resource directory.
    pub fn with_cmap_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cmap_dirs.push(dir.into());
        self
    }
}
