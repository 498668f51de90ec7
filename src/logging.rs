//! Logger setup and the `success` / `warning` logging macros.
//!
//! Resolution outcomes are logged under two extra targets: `success` (a group or scope came up)
//! and `warning` (something requested was not there). The formatter colours them apart from
//! plain records of the same level.

use env_logger::fmt::{Color, Formatter};
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Colour of a record: its target first, then its level.
fn record_color(target: &str, level: Level) -> Color {
    match (target, level) {
        ("success", _) => Color::Green,
        ("warning", Level::Error | Level::Warn) => Color::Magenta,
        ("warning", _) => Color::Yellow,
        (_, Level::Error) => Color::Red,
        (_, Level::Warn) => Color::Yellow,
        (_, Level::Info) => Color::White,
        (_, Level::Debug) => Color::Cyan,
        (_, Level::Trace) => Color::Rgb(150, 150, 150),
    }
}

/// `file:line` of a record relative to the crate root, or as recorded when outside of it.
fn location(record: &Record) -> String {
    let Some(file) = record.file() else {
        return "<unknown>".to_string();
    };
    let mut path = PathBuf::from(file);
    if path.is_relative() {
        if let Ok(cwd) = env::current_dir() {
            path = cwd.join(path);
        }
    }
    let shown = path
        .strip_prefix(Path::new(env!("CARGO_MANIFEST_DIR")))
        .unwrap_or(&path)
        .display()
        .to_string()
        .replace('\\', "/");
    format!("{shown}:{}", record.line().unwrap_or(0))
}

/// Installs the global logger.
///
/// One line per record: timestamp, level, message and source location. The level defaults to
/// `info` and `RUST_LOG` overrides it.
///
/// # Errors
/// Fails if a global logger is already installed.
pub fn init_log() -> anyhow::Result<()> {
    Builder::new()
        .format(|buf: &mut Formatter, record: &Record| {
            let mut style = buf.style();
            style.set_color(record_color(record.target(), record.level()));
            if record.level() <= Level::Warn {
                style.set_bold(true);
            }
            writeln!(
                buf,
                "{} {:<5} {}  ({})",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                style.value(record.level()),
                style.value(record.args()),
                location(record)
            )
        })
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .map_err(Into::into)
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_tagged {
    ($level:ident, $target:literal, $tag:literal, $($arg:tt)*) => {
        ::log::$level!(target: $target, "[{}] {}", $tag, format_args!($($arg)*))
    };
}

/// `info!` under the `success` target.
#[macro_export]
macro_rules! info_success {
    ($($arg:tt)*) => { $crate::__log_tagged!(info, "success", "SUCCESS", $($arg)*) };
}

#[macro_export]
macro_rules! debug_success {
    ($($arg:tt)*) => { $crate::__log_tagged!(debug, "success", "SUCCESS", $($arg)*) };
}

#[macro_export]
macro_rules! trace_success {
    ($($arg:tt)*) => { $crate::__log_tagged!(trace, "success", "SUCCESS", $($arg)*) };
}

/// `warn!` under the `warning` target: something requested is missing.
#[macro_export]
macro_rules! warn_warning {
    ($($arg:tt)*) => { $crate::__log_tagged!(warn, "warning", "WARNING", $($arg)*) };
}

#[macro_export]
macro_rules! debug_warning {
    ($($arg:tt)*) => { $crate::__log_tagged!(debug, "warning", "WARNING", $($arg)*) };
}

#[macro_export]
macro_rules! trace_warning {
    ($($arg:tt)*) => { $crate::__log_tagged!(trace, "warning", "WARNING", $($arg)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_take_precedence_over_levels() {
        assert!(matches!(record_color("success", Level::Trace), Color::Green));
        assert!(matches!(record_color("warning", Level::Warn), Color::Magenta));
        assert!(matches!(record_color("warning", Level::Debug), Color::Yellow));
        assert!(matches!(record_color("vkcaps::caps", Level::Error), Color::Red));
    }

    #[test]
    fn location_is_relative_to_the_crate() {
        let record = Record::builder()
            .file(Some(concat!(env!("CARGO_MANIFEST_DIR"), "/src/logging.rs")))
            .line(Some(12))
            .build();
        assert_eq!(location(&record), "src/logging.rs:12");
        assert_eq!(location(&Record::builder().build()), "<unknown>");
    }

    #[test]
    fn second_init_is_rejected() {
        let _ = init_log();
        assert!(init_log().is_err());
    }
}
