//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Hot-path cache sizing
    pub hotpath: HotPathSettings,
    /// Periodic cache refresh
    pub refresh: RefreshSettings,
    /// Log output
    pub logging: LoggingSettings,
}

/// `[hotpath]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotPathSettings {
    /// Ceiling on the memory the budget is derived from, in bytes
    pub maximum: usize,
    /// Free memory to assume instead of querying the host
    pub available: Option<usize>,
    /// Key namespace
    pub prefix: String,
    /// Whether key bytes count against the budget
    pub key: bool,
}

/// `[refresh]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Seconds between hot-path refreshes
    pub interval: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
