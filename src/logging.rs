//! Optional debug logging, kept off the interactive stream.
//!
//! Interactive stdout is a protocol surface (prompts, notices, status
//! lines), so log records go to a file instead: set `MINISH_LOG` to a file
//! path to capture them. Without the variable no logger is installed and
//! the `log` macros are no-ops. Best-effort: a failure to open the file
//! must never prevent the session from starting.

use simplelog::{Config, LevelFilter, WriteLogger};

pub fn init() {
    let Some(path) = std::env::var_os("MINISH_LOG") else {
        return;
    };
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };
    let _ = WriteLogger::init(LevelFilter::Debug, Config::default(), file);
}
