//! Console and file logging setup

use crate::error::{Error, Result};
use chrono::{Local, NaiveDate};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Logging options
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter for the stderr layer
    pub print_level: String,
    /// Filter for the file layer
    pub logfile_level: String,
    /// Directory for log files, no file logging when `None`
    pub log_dir: Option<PathBuf>,
    /// Log file name prefix
    pub name: Option<String>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            print_level: "info".to_string(),
            logfile_level: "debug".to_string(),
            log_dir: None,
            name: None,
        }
    }
}

impl LogOptions {
    pub fn with_print_level(mut self, level: impl Into<String>) -> Self {
        self.print_level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl AsRef<Path>, name: Option<String>) -> Self {
        self.log_dir = Some(dir.as_ref().to_path_buf());
        self.name = name;
        self
    }
}

/// Log file name for a given day: `<name>_YYYYMMDD.log` or `YYYYMMDD.log`
pub fn log_file_name(name: Option<&str>, date: NaiveDate) -> String {
    let stamp = date.format("%Y%m%d");
    match name {
        Some(name) if !name.is_empty() => format!("{}_{}.log", name, stamp),
        _ => format!("{}.log", stamp),
    }
}

/// Install a stderr layer and, when a log dir is set, a file layer.
///
/// Returns the log file path if file logging is enabled.
pub fn init_logging(options: &LogOptions) -> Result<Option<PathBuf>> {
    let print_filter = parse_filter(&options.print_level)?;
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(print_filter);

    let (file_layer, log_path) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(
                options.name.as_deref(),
                Local::now().date_naive(),
            ));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(parse_filter(&options.logfile_level)?);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Generic(format!("Failed to initialize logging: {}", e)))?;

    Ok(log_path)
}

fn parse_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| Error::Generic(format!("Invalid log filter '{}': {}", level, e)))
}
