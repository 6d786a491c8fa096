use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tableau_client::TableauConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log files past this size are emptied when a session starts
pub const LOG_FILE_LIMIT: u64 = 1 << 20;

/// Install the global subscriber for `component`.
///
/// `RUST_LOG` wins over `default_filter`. With `file_logging` the same
/// events also go to `logs/{component}.log` under the tableau data
/// directory, and the returned guard flushes that file when dropped.
pub fn init_logging(
    component: &str,
    file_logging: bool,
    default_filter: &str,
) -> io::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let console = fmt::layer().with_writer(io::stderr);

    if !file_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .init();
        return Ok(None);
    }

    let (file, path) = open_log_file(&log_dir()?, component)?;
    let (writer, guard) = tracing_appender::non_blocking(BufWriter::new(file));
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    tracing::info!(target: "session", "Writing {} log to {}", component, path.display());
    Ok(Some(guard))
}

fn log_dir() -> io::Result<PathBuf> {
    let data = TableauConfig::data_dir()
        .map_err(|err| io::Error::new(io::ErrorKind::NotFound, err.to_string()))?;
    Ok(data.join("logs"))
}

/// Open `{dir}/{component}.log` for appending, creating `dir` as needed
fn open_log_file(dir: &Path, component: &str) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{component}.log"));
    reset_if_oversized(&path)?;

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Empty `path` when it has grown past [`LOG_FILE_LIMIT`]. A missing file is fine.
fn reset_if_oversized(path: &Path) -> io::Result<bool> {
    let len = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if len <= LOG_FILE_LIMIT {
        return Ok(false);
    }
    File::create(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_only_oversized_logs_are_reset() {
        let tmp = tempfile::tempdir().unwrap();
        let small = tmp.path().join("small.log");
        let big = tmp.path().join("big.log");

        fs::write(&small, b"short").unwrap();
        let mut file = File::create(&big).unwrap();
        file.write_all(&vec![b'x'; (LOG_FILE_LIMIT + 1) as usize])
            .unwrap();
        drop(file);

        assert!(!reset_if_oversized(&small).unwrap());
        assert!(reset_if_oversized(&big).unwrap());
        assert!(!reset_if_oversized(&tmp.path().join("absent.log")).unwrap());

        assert_eq!(fs::metadata(&small).unwrap().len(), 5);
        assert_eq!(fs::metadata(&big).unwrap().len(), 0);
    }

    #[test]
    fn test_log_file_is_created_under_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");

        let (mut file, path) = open_log_file(&dir, "cli").unwrap();
        writeln!(file, "first").unwrap();
        drop(file);
        let (mut file, _) = open_log_file(&dir, "cli").unwrap();
        writeln!(file, "second").unwrap();
        drop(file);

        assert_eq!(path, dir.join("cli.log"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
