//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;

const SIZE_HINT: &str = "expected format like '2GB', '500MB', '1024KB' or a byte count";

/// Parse an `Ini` into a `ConfigFile`, overlaying values onto the defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [hotpath] section
    if let Some(section) = ini.section(Some("hotpath")) {
        if let Some(v) = section.get("maximum") {
            config.hotpath.maximum =
                parse_size(v).map_err(|_| invalid("hotpath", "maximum", v, SIZE_HINT))?;
            if config.hotpath.maximum == 0 {
                return Err(invalid("hotpath", "maximum", v, "must be greater than zero"));
            }
        }
        if let Some(v) = section.get("available") {
            let v = v.trim();
            if !v.is_empty() {
                let available =
                    parse_size(v).map_err(|_| invalid("hotpath", "available", v, SIZE_HINT))?;
                // Zero means "ask the host"
                config.hotpath.available = (available > 0).then_some(available);
            }
        }
        if let Some(v) = section.get("prefix") {
            let v = v.trim();
            if !v.is_empty() {
                config.hotpath.prefix = v.to_string();
            }
        }
        if let Some(v) = section.get("key") {
            config.hotpath.key = parse_bool(v)
                .ok_or_else(|| invalid("hotpath", "key", v, "must be true or false"))?;
        }
    }

    // [refresh] section
    if let Some(section) = ini.section(Some("refresh")) {
        if let Some(v) = section.get("interval") {
            config.refresh.interval = v
                .trim()
                .parse()
                .ok()
                .filter(|secs: &u64| *secs > 0)
                .ok_or_else(|| {
                    invalid("refresh", "interval", v, "must be a positive integer (seconds)")
                })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a boolean setting.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expand ~ to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_KEY_PREFIX;
    use crate::config::defaults::*;

    fn parse(source: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(source).unwrap())
    }

    #[test]
    fn test_empty_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            "[hotpath]\n\
             maximum = 2GB\n\
             available = 512MB\n\
             prefix = _Hot\n\
             key = true\n\
             [refresh]\n\
             interval = 5\n\
             [logging]\n\
             file = /var/log/sfs.log\n",
        )
        .unwrap();

        assert_eq!(config.hotpath.maximum, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.hotpath.available, Some(512 * 1024 * 1024));
        assert_eq!(config.hotpath.prefix, "_Hot");
        assert!(config.hotpath.key);
        assert_eq!(config.refresh.interval, 5);
        assert_eq!(config.logging.file, PathBuf::from("/var/log/sfs.log"));
    }

    #[test]
    fn test_bare_byte_counts() {
        let config = parse("[hotpath]\nmaximum = 1700000000\navailable = 100\n").unwrap();
        assert_eq!(config.hotpath.maximum, DEFAULT_MAXIMUM);
        assert_eq!(config.hotpath.available, Some(100));
        assert_eq!(config.hotpath_config().budget_bytes(), 2);
    }

    #[test]
    fn test_zero_or_empty_available_means_detect() {
        assert_eq!(parse("[hotpath]\navailable = 0\n").unwrap().hotpath.available, None);
        assert_eq!(parse("[hotpath]\navailable =\n").unwrap().hotpath.available, None);
    }

    #[test]
    fn test_blank_prefix_keeps_default() {
        assert_eq!(parse("[hotpath]\nprefix =\n").unwrap().hotpath.prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(parse("[hotpath]\nprefix =   \n").unwrap().hotpath.prefix, DEFAULT_KEY_PREFIX);
    }

    #[test]
    fn test_invalid_size() {
        match parse("[hotpath]\nmaximum = huge\n").unwrap_err() {
            ConfigFileError::InvalidValue {
                section,
                key,
                value,
                ..
            } => {
                assert_eq!(section, "hotpath");
                assert_eq!(key, "maximum");
                assert_eq!(value, "huge");
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_maximum_rejected() {
        assert!(matches!(
            parse("[hotpath]\nmaximum = 0\n"),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_bool() {
        assert!(matches!(
            parse("[hotpath]\nkey = maybe\n"),
            Err(ConfigFileError::InvalidValue { .. })
        ));
        assert!(!parse("[hotpath]\nkey = off\n").unwrap().hotpath.key);
    }

    #[test]
    fn test_invalid_interval() {
        for bad in ["0", "-3", "soon"] {
            let source = format!("[refresh]\ninterval = {bad}\n");
            assert!(
                matches!(parse(&source), Err(ConfigFileError::InvalidValue { .. })),
                "interval = {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_sections_ignored() {
        let config = parse("[unrelated]\nanything = 1\n").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs/sfs.log"), home.join("logs/sfs.log"));
        }
    }
}
