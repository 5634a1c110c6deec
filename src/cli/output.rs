//! Output formatting
//!
//! Utilities for log-level selection, status prefixes and error display.

/// Translate `-v`/`-q` flags into a tracing level filter
pub fn level_filter(verbose: u8, quiet: bool) -> tracing::level_filters::LevelFilter {
    use tracing::level_filters::LevelFilter;
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Print a top-level error with its cause chain
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(level_filter(3, true), LevelFilter::ERROR);
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
    }
}
