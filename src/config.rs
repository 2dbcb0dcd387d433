//! Config handling

use simple_logger::SimpleLogger;
use tracing::log::{LevelFilter, SetLoggerError};

/// Dependencies that are too chatty at info level, with the level they are
/// capped at outside debug mode.
const QUIET_MODULES: &[(&str, LevelFilter)] = &[
    ("tracing", LevelFilter::Warn),
    ("tower_sessions", LevelFilter::Warn),
    ("tower_http", LevelFilter::Warn),
    ("reqwest", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
    ("rustls", LevelFilter::Info),
    ("h2", LevelFilter::Info),
];

/// Logger for the studio binaries. Debug mode lifts every cap.
fn build_logger(debug: bool) -> SimpleLogger {
    if debug {
        return SimpleLogger::new().with_level(LevelFilter::Debug);
    }
    QUIET_MODULES.iter().fold(
        SimpleLogger::new().with_level(LevelFilter::Info),
        |logger, (module, level)| logger.with_module_level(module, *level),
    )
}

/// Installs the global logger. Fails if one is already installed.
pub fn setup_logging(debug: bool) -> Result<(), SetLoggerError> {
    build_logger(debug).init().inspect_err(|err| {
        eprintln!("Failed to initialize logger: {err}");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_sets_level() {
        assert_eq!(build_logger(true).max_level(), LevelFilter::Debug);
        assert_eq!(build_logger(false).max_level(), LevelFilter::Info);
    }
}
