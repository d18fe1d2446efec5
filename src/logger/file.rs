/// Append-only file sink for log lines
///
/// Lines are appended to `data/logs/swapdesk.log` (or the path passed to
/// `init_file_logging_at`). Write failures are reported once on stderr and
/// never interrupt the caller.
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_PATH: &str = "data/logs/swapdesk.log";

struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

static FILE_SINK: Lazy<Mutex<Option<FileSink>>> = Lazy::new(|| Mutex::new(None));
static WRITE_ERROR_REPORTED: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(false));

/// Open the default log file
pub fn init_file_logging() {
    init_file_logging_at(Path::new(DEFAULT_LOG_PATH));
}

/// Open a log file at the given path, creating parent directories
pub fn init_file_logging_at(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("⚠️  Failed to create log directory {}: {}", parent.display(), e);
            return;
        }
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            *FILE_SINK.lock() = Some(FileSink {
                path: path.to_path_buf(),
                writer: BufWriter::new(file),
            });
        }
        Err(e) => eprintln!("⚠️  Failed to open log file {}: {}", path.display(), e),
    }
}

/// Append one line; no-op when the sink is not initialised
pub fn write_to_file(line: &str) {
    let mut guard = FILE_SINK.lock();
    let Some(sink) = guard.as_mut() else {
        return;
    };

    if let Err(e) = writeln!(sink.writer, "{}", line) {
        let mut reported = WRITE_ERROR_REPORTED.lock();
        if !*reported {
            eprintln!("⚠️  Failed to write log file {}: {}", sink.path.display(), e);
            *reported = true;
        }
    }
}

/// Flush buffered lines to disk
pub fn flush_file_logging() {
    if let Some(sink) = FILE_SINK.lock().as_mut() {
        let _ = sink.writer.flush();
    }
}
