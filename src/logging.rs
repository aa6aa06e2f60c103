//! Diagnostic logging.
//!
//! Pipeline stages emit `tracing` events; the CLI installs one fmt
//! subscriber on stderr so stdout stays reserved for the report.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum level shown when `RUST_LOG` is unset.
    pub level: Level,
    /// Include the module path of each event.
    pub include_target: bool,
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_target: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Debug-level output with module paths.
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
            ..Self::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Picks a config from the CLI's `-v` / `-q` flags; `quiet` wins.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::quiet()
        } else if verbose {
            Self::verbose()
        } else {
            Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()))
    }
}

/// Installs the global subscriber.
///
/// Returns an error message if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}
