//! Configuration for sfs components.
//!
//! Settings are read from an INI file (default `~/.sfs/config.ini`):
//!
//! ```ini
//! [hotpath]
//! maximum = 1700000000
//! available = 512MB
//! prefix = _HotPath
//! key = false
//!
//! [refresh]
//! interval = 30
//!
//! [logging]
//! file = logs/sfs.log
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sfs::config::ConfigFile;
//! use sfs::factory::FileFactory;
//!
//! let config = ConfigFile::load()?;
//! let factory = FileFactory::new(config.factory_config());
//! # Ok::<(), sfs::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::{DEFAULT_MAXIMUM, DEFAULT_REFRESH_INTERVAL};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, HotPathSettings, LoggingSettings, RefreshSettings};
pub use size::{format_size, parse_size, Size, SizeParseError};
