//! Tracing setup for the command-line tool

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level forced by `-v`/`-q`, if any
pub fn flag_level(verbose: u8, quiet: bool) -> Option<Level> {
    match (quiet, verbose) {
        (true, _) => Some(Level::ERROR),
        (false, 0) => None,
        (false, 1) => Some(Level::DEBUG),
        (false, _) => Some(Level::TRACE),
    }
}

/// Build the filter: `RUST_LOG` if set, else the settings level, with the
/// command-line flags applied on top
pub fn filter(settings_level: &str, verbose: u8, quiet: bool) -> EnvFilter {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    match flag_level(verbose, quiet) {
        Some(level) => filter.add_directive(level.into()),
        None => filter,
    }
}

/// Install the global subscriber, writing to stderr
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init(settings_level: &str, verbose: u8, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(settings_level, verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
