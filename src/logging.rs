//! Console logging
//!
//! Every line goes to stdout as `[YYYY-MM-DD HH:MM:SS] [LEVEL] message`.
//! `log` has no SUCCESS level, so success lines are emitted at INFO under
//! [`SUCCESS_TARGET`] and relabelled by the formatter.

use std::io::Write;

use log::{Level, LevelFilter};

/// Log target whose records are rendered with the `SUCCESS` label.
pub const SUCCESS_TARGET: &str = "svarog::success";

/// Log a line at the SUCCESS level.
#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        log::info!(target: $crate::logging::SUCCESS_TARGET, $($arg)+)
    };
}

/// Initialize the global logger.
///
/// `RUST_LOG` takes precedence over the `verbose` default.
pub fn init(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let result = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                level_label(record.level(), record.target()),
                record.args()
            )
        })
        .try_init();

    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }
}

/// Label printed for a record of `level` emitted under `target`.
pub fn level_label(level: Level, target: &str) -> &'static str {
    if target == SUCCESS_TARGET {
        return "SUCCESS";
    }
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
