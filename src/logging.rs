use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Logs to stdout, and additionally to `log_file` when one is given. The file
/// never grows much past 10 MB; once it does, only its newest half is kept.
pub fn init_logging(log_level: Level, log_file: Option<&str>) -> anyhow::Result<()> {
    let level_filter = LevelFilter::from_level(log_level);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(level_filter);

    let file_layer = log_file.map(|path| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(capped_file_writer(PathBuf::from(path), LOG_FILE_MAX_BYTES))
            .with_filter(level_filter)
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

fn capped_file_writer(path: PathBuf, max_len: u64) -> impl Fn() -> CappedFileWriter {
    let lock = Arc::new(Mutex::new(()));
    move || CappedFileWriter { path: path.clone(), max_len, lock: lock.clone() }
}

/// One log event's worth of output; the shared lock serializes trim + append
/// across events written from different threads.
struct CappedFileWriter {
    path: PathBuf,
    max_len: u64,
    lock: Arc<Mutex<()>>,
}

impl Write for CappedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let len = std::fs::metadata(&self.path).map(|meta| meta.len()).unwrap_or(0);
        if len >= self.max_len {
            keep_tail(&self.path, self.max_len / 2)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Rewrites the file so that only its last `keep` bytes remain.
fn keep_tail(path: &Path, keep: u64) -> io::Result<()> {
    let mut tail = Vec::new();
    {
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();
        file.seek(SeekFrom::Start(size.saturating_sub(keep)))?;
        file.read_to_end(&mut tail)?;
    }
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(&tail)
}
