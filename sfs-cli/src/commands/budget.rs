//! `sfs budget`: show the hot-path budget for this host.

use clap::Args;
use sfs::cache::{
    compute_budget, ABUNDANT_PERCENTAGE, CONSTRAINED_PERCENTAGE, PROCESS_MEMORY_CEILING,
};
use sfs::config::{format_size, ConfigFile, Size};
use sfs::system::detect_free_memory;

/// Arguments for the budget command.
#[derive(Debug, Args)]
pub struct BudgetArgs {
    /// Override the configured memory ceiling (e.g. 2GB)
    #[arg(long)]
    pub maximum: Option<Size>,

    /// Assume this much free memory instead of asking the host (e.g. 512MB)
    #[arg(long)]
    pub available: Option<Size>,
}

/// How a budget was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetReport {
    pub maximum: usize,
    pub available: usize,
    pub detected: bool,
    pub budget: usize,
    pub percentage: usize,
}

/// Work out the budget from the arguments, falling back to the config.
pub fn describe(args: &BudgetArgs, config: &ConfigFile) -> BudgetReport {
    let maximum = args
        .maximum
        .map(Size::bytes)
        .unwrap_or(config.hotpath.maximum);

    let explicit = args
        .available
        .map(Size::bytes)
        .or(config.hotpath.available)
        .filter(|bytes| *bytes > 0);
    let available = explicit.unwrap_or_else(detect_free_memory);

    let budget = compute_budget(maximum, available);
    let percentage = if available.min(maximum) >= PROCESS_MEMORY_CEILING {
        ABUNDANT_PERCENTAGE
    } else {
        CONSTRAINED_PERCENTAGE
    };

    BudgetReport {
        maximum,
        available,
        detected: explicit.is_none(),
        budget,
        percentage,
    }
}

/// Run the budget command.
pub fn run(args: BudgetArgs, config: &ConfigFile) {
    let report = describe(&args, config);
    let source = if report.detected { "detected" } else { "configured" };

    println!("Maximum:   {}", format_size(report.maximum));
    println!("Available: {} ({})", format_size(report.available), source);
    println!(
        "Budget:    {} ({}% of {})",
        format_size(report.budget),
        report.percentage,
        format_size(report.available.min(report.maximum))
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(maximum: Option<usize>, available: Option<usize>) -> BudgetArgs {
        BudgetArgs {
            maximum: maximum.map(Size),
            available: available.map(Size),
        }
    }

    #[test]
    fn test_small_available() {
        let report = describe(&args(None, Some(100)), &ConfigFile::default());
        assert_eq!(report.budget, 2);
        assert_eq!(report.percentage, 2);
        assert!(!report.detected);
    }

    #[test]
    fn test_available_above_ceiling() {
        let report = describe(
            &args(None, Some(PROCESS_MEMORY_CEILING * 2)),
            &ConfigFile::default(),
        );
        assert_eq!(report.budget, PROCESS_MEMORY_CEILING / 10);
        assert_eq!(report.percentage, 10);
    }

    #[test]
    fn test_config_available_used_when_no_argument() {
        let mut config = ConfigFile::default();
        config.hotpath.available = Some(50_000);

        let report = describe(&args(None, None), &config);
        assert_eq!(report.budget, 1_000);
        assert!(!report.detected);
    }

    #[test]
    fn test_argument_overrides_maximum() {
        let report = describe(&args(Some(1_000), Some(5_000)), &ConfigFile::default());
        assert_eq!(report.maximum, 1_000);
        assert_eq!(report.budget, 20);
        assert_eq!(report.percentage, 2);
    }

    #[test]
    fn test_detects_when_unset() {
        let report = describe(&args(None, None), &ConfigFile::default());
        assert!(report.detected);
        assert!(report.available > 0);
    }
}
