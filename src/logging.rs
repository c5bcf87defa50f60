// File logger setup.
// - The terminal belongs to the TUI, so log records only go to app.log.
// - A failed logger init is reported on stderr and the app keeps running.
use std::{fs, path::Path};

use log::LevelFilter;

pub fn init(log_path: &Path, level: LevelFilter) {
    if let Some(dir) = log_path.parent()
        && let Err(err) = fs::create_dir_all(dir)
    {
        eprintln!("warning: cannot create log directory {}: {err}", dir.display());
    }

    let file = match fern::log_file(log_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("warning: cannot open log file {}: {err}", log_path.display());
            return;
        }
    };

    let result = fern::Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .chain(file)
        .apply();

    if let Err(err) = result {
        eprintln!("warning: logger init failed: {err}");
    }
}

pub fn parse_level(value: &str) -> LevelFilter {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_defaults_to_info() {
        assert_eq!(parse_level("loud"), LevelFilter::Info);
        assert_eq!(parse_level("WARNING"), LevelFilter::Warn);
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
    }
}
