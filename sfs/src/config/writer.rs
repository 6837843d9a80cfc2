//! INI serialization: `ConfigFile` → commented INI text.

use super::settings::ConfigFile;
use super::size::format_size;

/// Render `config` as the commented INI written to config.ini.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let available = config
        .hotpath
        .available
        .map(format_size)
        .unwrap_or_default();

    format!(
        r#"[hotpath]
; Upper bound on the memory the cache budget is derived from.
; Supports: KB, MB, GB suffixes or a plain byte count (default: 1700000000)
maximum = {}
; Free memory to size the cache against. Leave empty to query the host.
available = {}
; Namespace prepended to every cache key
prefix = {}
; Count key bytes against the budget (true/false)
key = {}

[refresh]
; Seconds between hot-path cache refreshes
interval = {}

[logging]
; Log file, truncated on startup
file = {}
"#,
        format_size(config.hotpath.maximum),
        available,
        config.hotpath.prefix,
        config.hotpath.key,
        config.refresh.interval,
        config.logging.file.display(),
    )
}
