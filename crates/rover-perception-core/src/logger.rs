//! Process-wide logging setup.
//!
//! Without the `tracing` feature, [`init_with_level`] installs a stderr
//! backend for the `log` facade that prints lines like
//!
//! ```text
//!    0.012s INFO  pipeline: step at (99.70, 85.60, 56.8deg): ...
//! ```
//!
//! Records from the `rover_perception*` crates pass at the requested level.
//! Every other target (image decoders and the like) is capped at `Warn`.
//!
//! With the `tracing` feature, [`init_tracing`] installs a `tracing-subscriber`
//! instead.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

const OWN_TARGET_PREFIX: &str = "rover_perception";
const FOREIGN_MAX: LevelFilter = LevelFilter::Warn;

/// Effective filter for records emitted under `target`.
fn filter_for(target: &str, level: LevelFilter) -> LevelFilter {
    if target.starts_with(OWN_TARGET_PREFIX) {
        level
    } else {
        level.min(FOREIGN_MAX)
    }
}

fn format_line(
    elapsed: Duration,
    level: Level,
    target: &str,
    args: &fmt::Arguments<'_>,
) -> String {
    let module = target.rsplit("::").next().unwrap_or(target);
    format!(
        "{:>8.3}s {:<5} {}: {}",
        elapsed.as_secs_f64(),
        level,
        module,
        args
    )
}

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= filter_for(metadata.target(), self.level)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr backend for the `log` facade.
///
/// Only the first call has an effect; later calls return `Ok(())` and keep
/// the original level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins when set. Otherwise the workspace crates log at
/// `default_level` and everything else at `warn`. `json` switches to
/// flattened JSON events. Span-close events carry step timings.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, default_level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let own = default_level.to_string().to_lowercase();
        let foreign = filter_for("", default_level).to_string().to_lowercase();
        EnvFilter::new(format!(
            "{foreign},rover_perception={own},rover_perception_core={own},rover_perception_map={own}"
        ))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_targets_are_capped_at_warn() {
        assert_eq!(
            filter_for("rover_perception_map::pipeline", LevelFilter::Debug),
            LevelFilter::Debug
        );
        assert_eq!(filter_for("png::decoder", LevelFilter::Debug), LevelFilter::Warn);
        assert_eq!(filter_for("png::decoder", LevelFilter::Error), LevelFilter::Error);
        assert_eq!(filter_for("anything", LevelFilter::Off), LevelFilter::Off);
    }

    #[test]
    fn line_shows_elapsed_level_and_module() {
        let line = format_line(
            Duration::from_millis(1500),
            Level::Info,
            "rover_perception_map::pipeline",
            &format_args!("navigable={}", 12),
        );
        assert_eq!(line, "   1.500s INFO  pipeline: navigable=12");
    }
}
