//! Stderr logging for the CLI and tests.
//!
//! Records look like `[   1234ms  WARN target_practice::session] skipping frame 3: ...`.
//! The level comes from the caller, or from `TARGET_PRACTICE_LOG` when set.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides the level passed to [`init_with_level`].
pub const LOG_ENV: &str = "TARGET_PRACTICE_LOG";

struct FrameLogger {
    max: LevelFilter,
    epoch: Instant,
}

impl Log for FrameLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let millis = self.epoch.elapsed().as_millis();
        let line = format!(
            "[{millis:>7}ms {:>5} {}] {}\n",
            record.level(),
            record.target(),
            record.args()
        );
        // A closed stderr is not worth failing a frame over.
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static INSTALLED: OnceLock<FrameLogger> = OnceLock::new();

/// Parse `off`, `error`, `warn`, `info`, `debug` or `trace` (any case).
pub fn parse_level(text: &str) -> Result<LevelFilter, String> {
    text.trim()
        .parse::<LevelFilter>()
        .map_err(|_| format!("unknown log level `{text}`"))
}

/// Install the stderr logger.
///
/// `TARGET_PRACTICE_LOG`, when it holds a valid level, wins over `level`.
/// Only the first call has an effect.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }
    let max = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| parse_level(&v).ok())
        .unwrap_or(level);
    let logger = INSTALLED.get_or_init(|| FrameLogger {
        max,
        epoch: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(max);
    Ok(())
}

/// Install a `tracing-subscriber` fmt subscriber filtered by `RUST_LOG`
/// (default `info`), with span close timings per pipeline stage.
///
/// `log` records are not bridged here; callers that want them install a
/// `tracing_log::LogTracer` first.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);
    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())
    } else {
        tracing::subscriber::set_global_default(
            builder.with_timer(fmt::time::Uptime::default()).finish(),
        )
    };
    if installed.is_err() {
        log::debug!("tracing subscriber already installed");
    }
}
