//! Free memory detection.

/// Detect the amount of free memory on the host in bytes.
///
/// # Platform Support
///
/// - **Linux**: Parses `MemAvailable` (or `MemFree` on old kernels) from
///   `/proc/meminfo`
/// - **Other platforms**: Returns fallback of 1GB
#[cfg(target_os = "linux")]
pub fn detect_free_memory() -> usize {
    match std::fs::read_to_string("/proc/meminfo") {
        Ok(content) => parse_available_memory(&content).unwrap_or_else(|| {
            tracing::debug!("No usable entry in /proc/meminfo, using fallback");
            fallback_memory()
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read /proc/meminfo, using fallback");
            fallback_memory()
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn detect_free_memory() -> usize {
    fallback_memory()
}

/// Extract the free memory figure from `/proc/meminfo` content.
///
/// Prefers `MemAvailable`, which accounts for reclaimable page cache, and
/// falls back to `MemFree`. Values are reported in kB.
pub fn parse_available_memory(content: &str) -> Option<usize> {
    let field = |name: &str| {
        content.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            // Format: "MemAvailable:    8123456 kB"
            let kb: usize = rest.split_whitespace().next()?.parse().ok()?;
            kb.checked_mul(1024)
        })
    };

    field("MemAvailable").or_else(|| field("MemFree"))
}

/// Fallback when detection fails.
const fn fallback_memory() -> usize {
    1024 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "MemTotal:       16384000 kB\n\
                          MemFree:         1024000 kB\n\
                          MemAvailable:    8192000 kB\n\
                          Buffers:          204800 kB\n";

    #[test]
    fn test_detect_free_memory_returns_positive() {
        assert!(detect_free_memory() > 0, "Should detect some memory");
    }

    #[test]
    fn test_parse_prefers_mem_available() {
        assert_eq!(parse_available_memory(SAMPLE), Some(8_192_000 * 1024));
    }

    #[test]
    fn test_parse_falls_back_to_mem_free() {
        let content = "MemTotal: 2048 kB\nMemFree: 512 kB\n";
        assert_eq!(parse_available_memory(content), Some(512 * 1024));
    }

    #[test]
    fn test_parse_ignores_similar_prefixes() {
        let content = "MemAvailableX: 1 kB\nMemFreeish: 2 kB\n";
        assert_eq!(parse_available_memory(content), None);
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_available_memory(""), None);
        assert_eq!(parse_available_memory("MemAvailable: lots kB"), None);
    }
}
