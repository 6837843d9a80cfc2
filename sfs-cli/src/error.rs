//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;
use sfs::config::ConfigFileError;
use sfs::factory::FactoryError;
use sfs::fs::FsError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be loaded
    Config(ConfigFileError),
    /// Failed to load a file into the factory
    Load(FactoryError),
    /// Hot-path refresh failed
    Refresh(FactoryError),
    /// An existence check could not complete
    Check { path: PathBuf, source: FsError },
    /// Command arguments were unusable
    InvalidArgument(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Check the value in your config file:");
                eprintln!("  {}", sfs::config::config_file_path().display());
                eprintln!("Sizes accept KB, MB, GB suffixes or a plain byte count.");
            }
            CliError::LoggingInit(_) => {
                eprintln!();
                eprintln!("Set [logging] file in the config to a writable location.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Load(e) => write!(f, "Failed to load file: {}", e),
            CliError::Refresh(e) => write!(f, "Failed to refresh hot-path cache: {}", e),
            CliError::Check { path, source } => {
                write!(f, "Failed to check {}: {}", path.display(), source)
            }
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Load(e) => Some(e),
            CliError::Refresh(e) => Some(e),
            CliError::Check { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display() {
        let err = CliError::InvalidArgument("--repeat must be at least 1".to_string());
        assert_eq!(err.to_string(), "Invalid argument: --repeat must be at least 1");
    }

    #[test]
    fn test_config_error_has_source() {
        let err: CliError = ConfigFileError::InvalidValue {
            section: "refresh".to_string(),
            key: "interval".to_string(),
            value: "never".to_string(),
            reason: "must be a positive integer (seconds)".to_string(),
        }
        .into();

        assert!(err.to_string().contains("refresh.interval"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_refresh_error_display() {
        let err = CliError::Refresh(FactoryError::Destroyed);
        assert_eq!(
            err.to_string(),
            "Failed to refresh hot-path cache: File factory has been destroyed"
        );
    }

    #[test]
    fn test_check_error_display() {
        let err = CliError::Check {
            path: PathBuf::from("/srv/a"),
            source: FsError::Abandoned,
        };
        assert_eq!(
            err.to_string(),
            "Failed to check /srv/a: Operation abandoned before completion"
        );
        assert!(err.source().is_some());
    }
}
