//! Logging setup for applications embedding kiln.
//!
//! Only available with the `logging` feature. Library code emits `tracing`
//! events; these helpers install a subscriber that shows the ones coming
//! from kiln crates.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Crates whose events the level applies to
const KILN_TARGETS: [&str; 2] = ["kiln_build", "kiln_config"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// No output
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    /// Target routing and loader selection
    Debug,
    /// Every matcher evaluation
    Trace,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// `kiln_build=<level>,kiln_config=<level>`
    fn directives(&self) -> String {
        KILN_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.as_filter()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter())
    }
}

/// Install a subscriber showing kiln events at `level`.
///
/// Only the first call in a process has an effect. `RUST_LOG` directives are
/// added on top.
///
/// ```rust,no_run
/// use kiln_build::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::builder().parse_lossy(level.directives());
        if let Ok(extra) = std::env::var(EnvFilter::DEFAULT_ENV) {
            for directive in extra.split(',').filter_map(|d| d.parse().ok()) {
                filter = filter.add_directive(directive);
            }
        }
        install(filter);
    });
}

/// Install a subscriber configured only from `RUST_LOG`, defaulting to
/// `info` for kiln crates.
pub fn init_logging_from_env() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::builder().parse_lossy(LogLevel::Info.directives()));
        install(filter);
    });
}

fn install(filter: EnvFilter) {
    // Another subscriber may already be installed by the host
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).without_time())
        .try_init();
}
