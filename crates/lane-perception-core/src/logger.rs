//! Stderr logging with per-module levels.
//!
//! Levels come from a directive string in the `RUST_LOG` style:
//! `"warn,lane_perception_detector::locate=trace"` sets a global level of
//! `warn` and turns on `trace` for one module. The most specific matching
//! directive wins. With the `tracing` feature, [`init_tracing`] installs a
//! `tracing-subscriber` pipeline that reads the same syntax.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Parsed log directives: a default level plus per-module overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSpec {
    default: LevelFilter,
    modules: Vec<(String, LevelFilter)>,
}

impl Default for LogSpec {
    fn default() -> Self {
        Self::new(LevelFilter::Info)
    }
}

impl LogSpec {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            modules: Vec::new(),
        }
    }

    /// Parse comma-separated `level` and `module=level` directives.
    ///
    /// Unknown level names are skipped. A bare module name enables `trace`
    /// for it, as `env_logger` does.
    pub fn parse(directives: &str) -> Self {
        let mut spec = Self::default();
        for part in directives.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((module, level)) => {
                    if let Ok(level) = LevelFilter::from_str(level.trim()) {
                        spec = spec.with_module(module.trim(), level);
                    }
                }
                None => match LevelFilter::from_str(part) {
                    Ok(level) => spec.default = level,
                    Err(_) => spec = spec.with_module(part, LevelFilter::Trace),
                },
            }
        }
        spec
    }

    /// `RUST_LOG` when it is set, otherwise `fallback`.
    pub fn from_env_or(fallback: &str) -> Self {
        match std::env::var("RUST_LOG") {
            Ok(env) if !env.trim().is_empty() => Self::parse(&env),
            _ => Self::parse(fallback),
        }
    }

    pub fn with_module(mut self, module: &str, level: LevelFilter) -> Self {
        self.modules.retain(|(m, _)| m != module);
        self.modules.push((module.to_string(), level));
        self
    }

    /// Level in effect for a record target.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.modules
            .iter()
            .filter(|(module, _)| covers(module, target))
            .max_by_key(|(module, _)| module.len())
            .map_or(self.default, |&(_, level)| level)
    }

    /// Most verbose level any directive can let through.
    pub fn max_level(&self) -> LevelFilter {
        self.modules
            .iter()
            .map(|&(_, level)| level)
            .fold(self.default, Ord::max)
    }
}

// `lane_perception` covers `lane_perception::detect` but not `lane_perception_detector`.
fn covers(module: &str, target: &str) -> bool {
    target
        .strip_prefix(module)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

struct StderrLogger {
    spec: LogSpec,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.spec.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let _ = write_record(&mut std::io::stderr().lock(), elapsed, record);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// `  12.345s WARN  lane_perception_detector::rectify: message`
fn write_record(out: &mut impl Write, elapsed: f64, record: &Record) -> std::io::Result<()> {
    writeln!(
        out,
        "{:>8.3}s {:<5} {}: {}",
        elapsed,
        record.level(),
        record.target(),
        record.args()
    )
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger.
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_with_spec(spec: LogSpec) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let max = spec.max_level();
    let logger = LOGGER.get_or_init(|| StderrLogger {
        spec,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(max);
    Ok(())
}

/// Install a `tracing-subscriber` formatter.
///
/// `RUST_LOG` takes precedence over `default_filter` when set.
#[cfg(feature = "tracing")]
pub fn init_tracing(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
