//! Logging setup for programs built on the Nomad client crates.
//!
//! The client crates emit [`tracing`] events (`nomad_http` logs retries and
//! redirects, `nomad_api` logs lookups). This crate installs a subscriber
//! for them, configured from the environment.
//!
//! # Usage
//!
//! ```rust
//! nomad_log::init();
//! tracing::info!(address = "http://127.0.0.1:4646", "Connecting");
//! ```
//!
//! # Environment Variables
//!
//! - `NOMAD_DEBUG=1` - Enable debug logging
//! - `NOMAD_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `NOMAD_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `NOMAD_LOG_COLOR=1|0` - Enable/disable colors
//! - `RUST_LOG` - Full filter directives; takes precedence over the level

use std::env;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::EnvFilter;

/// Minimum severity to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    /// Filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            other => Err(format!("unknown log level `{other}'")),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line, human oriented
    Pretty,
    /// One line per event
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown log format `{other}'")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub color: bool,
    /// Raw `RUST_LOG` directives, when set.
    pub directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Compact,
            color: false,
            directives: None,
        }
    }
}

impl LogConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the configuration through `lookup`. Unparseable values fall back
    /// to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| {
            lookup(name).map(|v| {
                let v = v.trim().to_lowercase();
                v == "1" || v == "true" || v == "yes"
            })
        };

        let debug = flag("NOMAD_DEBUG").unwrap_or(false);
        let level = lookup("NOMAD_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { Level::Info });
        let format = lookup("NOMAD_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Format::Compact);
        let color = flag("NOMAD_LOG_COLOR")
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());
        let directives = lookup("RUST_LOG").filter(|s| !s.trim().is_empty());

        Self {
            level,
            format,
            color,
            directives,
        }
    }

    /// The event filter: `RUST_LOG` directives when present and valid,
    /// otherwise the configured level.
    pub fn filter(&self) -> EnvFilter {
        self.directives
            .as_deref()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(self.level.as_str()))
    }
}

static INSTALLED: OnceCell<LogConfig> = OnceCell::new();

/// Install a global subscriber configured from the environment.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init() {
    init_with(LogConfig::from_env());
}

/// Install a global subscriber with an explicit configuration.
///
/// Returns the configuration in effect, which is the first one installed.
/// If another subscriber was already set elsewhere, it is left in place.
pub fn init_with(config: LogConfig) -> &'static LogConfig {
    INSTALLED.get_or_init(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(config.filter())
            .with_ansi(config.color)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr);

        let installed = match config.format {
            Format::Pretty => builder.pretty().try_init(),
            Format::Compact => builder.compact().try_init(),
            #[cfg(feature = "json")]
            Format::Json => builder.json().try_init(),
            #[cfg(not(feature = "json"))]
            Format::Json => builder.compact().try_init(),
        };
        if installed.is_ok() {
            tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
        }
        config
    })
}

/// The configuration installed by [`init`], if any.
pub fn config() -> Option<&'static LogConfig> {
    INSTALLED.get()
}
