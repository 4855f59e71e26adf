//! Utility modules for the scanner

/// Logging utilities
pub struct Logger;

impl Logger {
    /// Initialize logger with specified level. `RUST_LOG` still wins for
    /// individual modules.
    pub fn init(level: log::LevelFilter) {
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .format_timestamp_secs()
            .init();
    }

    /// Level for the number of `-v` flags given on the command line
    pub fn level_for_verbosity(verbosity: u8) -> log::LevelFilter {
        match verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
