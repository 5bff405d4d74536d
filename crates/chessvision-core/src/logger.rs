//! Logging setup shared by the `chessvision` crates and CLI.
//!
//! One `-v` count drives both backends: the plain stderr logger and, with
//! feature `tracing`, a `tracing-subscriber` pipeline. Records from the
//! `chessvision*` crates follow the requested level; everything else is held
//! at `warn` so dependency chatter stays out of `-vv` runs.
//!
//! Plain lines look like `[  0.012s DEBUG chessvision_board::grid] message`.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Target prefix shared by every crate of the workspace.
const OWN_TARGET: &str = "chessvision";

/// Effective level for `target` when the workspace runs at `level`.
fn level_for_target(target: &str, level: LevelFilter) -> LevelFilter {
    if target.starts_with(OWN_TARGET) {
        level
    } else {
        level.min(LevelFilter::Warn)
    }
}

struct PipelineLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for PipelineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= level_for_target(metadata.target(), self.level)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<PipelineLogger> = OnceLock::new();

/// Install the plain stderr logger at `level`.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| PipelineLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Map a `-v` repetition count to a level: warnings by default, then info,
/// debug, trace.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `EnvFilter` directive equivalent to the plain logger's filtering at `level`.
pub fn tracing_directive(level: LevelFilter) -> String {
    let own = level.to_string().to_ascii_lowercase();
    let rest = level.min(LevelFilter::Warn).to_string().to_ascii_lowercase();
    format!("{rest},{OWN_TARGET}={own}")
}

/// Install a `tracing` subscriber. `RUST_LOG` wins when set; otherwise the
/// filter follows [`tracing_directive`] for `level`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_directive(level)));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_saturates_at_trace() {
        assert_eq!(level_from_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_from_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(9), LevelFilter::Trace);
    }

    #[test]
    fn dependencies_stay_at_warn() {
        let logger = PipelineLogger {
            level: LevelFilter::Debug,
            started: Instant::now(),
        };
        let meta = |target: &'static str, level| {
            Metadata::builder().target(target).level(level).build()
        };
        assert!(logger.enabled(&meta("chessvision_board::grid", log::Level::Debug)));
        assert!(logger.enabled(&meta("chessvision", log::Level::Info)));
        assert!(!logger.enabled(&meta("image::codecs::png", log::Level::Info)));
        assert!(logger.enabled(&meta("image::codecs::png", log::Level::Warn)));
    }

    #[test]
    fn directive_mirrors_plain_filtering() {
        assert_eq!(tracing_directive(LevelFilter::Warn), "warn,chessvision=warn");
        assert_eq!(tracing_directive(LevelFilter::Debug), "warn,chessvision=debug");
        assert_eq!(tracing_directive(LevelFilter::Error), "error,chessvision=error");
        assert_eq!(tracing_directive(LevelFilter::Off), "off,chessvision=off");
    }
}
