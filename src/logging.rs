//! A small stderr logger for the bench binary, colour-coded by level.
//!
//! The level comes from the `LOCKER_LOG` environment variable:
//! `error`, `warn`, `info` (default), `debug`, `trace` or `off`.
//! The locks themselves never log - they are far too hot for that.

use std::{env, io::Write};

use log::{Level, LevelFilter, Log, Metadata, Record};

pub const LOG_VAR: &str = "LOCKER_LOG";

/// Call once at the start of `main`; later calls keep the first logger.
pub fn init() {
    static LOGGER: StderrLogger = StderrLogger;
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level_filter(env::var(LOG_VAR).ok().as_deref()));
    }
}

pub fn level_filter(value: Option<&str>) -> LevelFilter {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("off") => LevelFilter::Off,
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // a failed write to stderr has nowhere to be reported
        let _ = writeln!(
            std::io::stderr().lock(),
            "\u{1B}[{}m[{:>5}][{}] {}\u{1B}[0m",
            color_code(record.level()),
            record.level(),
            std::thread::current().name().unwrap_or("-"),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn color_code(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 34,  // Blue
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}
