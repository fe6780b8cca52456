//! Logging setup for the terminal UI.
//!
//! The TUI owns stdout, so all output goes to a daily-rolling JSON file under
//! the data directory. `log` macros are bridged into `tracing`, and rolled
//! files from previous days are gzip-compressed in the background.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

/// File name prefix for rolled log files.
pub const LOG_FILE_PREFIX: &str = "novel-desk.log";

/// Initialize file-only logging.
///
/// Returns a `WorkerGuard` which must be kept alive for the duration of the
/// application so buffered logs are flushed on shutdown.
pub fn init(log_dir: &Path) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter);

    // No stdout layer: the TUI owns the terminal
    let subscriber = tracing_subscriber::registry().with(file_layer);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    let log_dir = log_dir.to_path_buf();
    std::thread::spawn(move || {
        compress_old_logs(log_dir);
    });

    guard
}

/// Whether a file in the log directory is a rolled log from a previous day.
fn should_compress(name: &str, today_suffix: &str) -> bool {
    name.starts_with(&format!("{LOG_FILE_PREFIX}."))
        && !name.ends_with(today_suffix)
        && !name.ends_with(".gz")
}

fn compress_old_logs(log_dir: PathBuf) {
    let today_suffix = chrono::Local::now().format("%Y-%m-%d").to_string();

    let Ok(entries) = fs::read_dir(&log_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !should_compress(name, &today_suffix) {
            continue;
        }
        match compress_file(&path) {
            Ok(()) => log::info!("Compressed old log: {:?}", path),
            Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
        }
    }
}

/// Gzip `path` to `path.gz` and remove the original.
fn compress_file(path: &Path) -> std::io::Result<()> {
    let file = fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);

    let mut gz_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_name.push(".gz");
    let parent_dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "No parent directory"))?;
    let gz_path = parent_dir.join(gz_name);

    if gz_path.exists() {
        return Ok(());
    }

    let output = fs::File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    std::io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;
    Ok(())
}
