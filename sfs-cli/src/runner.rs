//! CLI runner for common setup.
//!
//! Loads configuration and initializes logging once, so command handlers
//! start from a ready environment.

use crate::error::CliError;
use sfs::config::ConfigFile;
use sfs::factory::FileFactory;
use sfs::logging::{init_logging, LoggingGuard};
use std::path::Path;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load configuration (from `config_path`, or the default location) and
    /// initialize logging.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(version = sfs::VERSION, command, "sfs starting");
    }

    /// Create a file factory from the loaded configuration.
    pub fn create_factory(&self) -> FileFactory {
        let factory = FileFactory::new(self.config.factory_config());
        info!(
            budget_bytes = factory.cache().budget_bytes(),
            prefix = factory.cache().prefix(),
            "File factory created"
        );
        factory
    }
}
