//! Default values for every configuration setting.

use std::time::Duration;

use super::settings::*;
use crate::cache::{HotPathConfig, DEFAULT_KEY_PREFIX, PROCESS_MEMORY_CEILING};
use crate::factory::{FactoryConfig, DEFAULT_REFRESH_INTERVAL_SECS};
use crate::logging::default_log_file;

/// Default `[hotpath] maximum`.
pub const DEFAULT_MAXIMUM: usize = PROCESS_MEMORY_CEILING;

/// Default `[refresh] interval` in seconds.
pub const DEFAULT_REFRESH_INTERVAL: u64 = DEFAULT_REFRESH_INTERVAL_SECS;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            hotpath: HotPathSettings::default(),
            refresh: RefreshSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for HotPathSettings {
    fn default() -> Self {
        Self {
            maximum: DEFAULT_MAXIMUM,
            available: None,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            key: false,
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl ConfigFile {
    /// Hot-path cache configuration for these settings.
    pub fn hotpath_config(&self) -> HotPathConfig {
        let config = HotPathConfig::default()
            .with_maximum(self.hotpath.maximum)
            .with_prefix(self.hotpath.prefix.clone())
            .with_key_accounting(self.hotpath.key);

        match self.hotpath.available {
            Some(available) => config.with_available(available),
            None => config,
        }
    }

    /// Factory configuration for these settings.
    pub fn factory_config(&self) -> FactoryConfig {
        FactoryConfig::new(self.hotpath_config())
            .with_refresh_interval(Duration::from_secs(self.refresh.interval))
    }
}
