// Tracing setup shared by the binaries

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Log to stderr. `RUST_LOG` overrides `default_filter`.
pub fn init_stderr(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to a daily-rolled file while the terminal UI owns the screen.
///
/// Lines are written on a background thread; keep the returned guard alive
/// until the UI exits so buffered lines are flushed.
pub fn init_file(default_filter: &str, path: &Path) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("creating log directory {}", dir.display()))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("log path has no file name: {}", path.display()))?;

    let file_appender = tracing_appender::rolling::daily(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_file_creates_log_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("finance-buddy.log");

        let guard = init_file("info", &path).unwrap();
        tracing::info!("terminal ui started");
        drop(guard);

        assert!(dir.path().join("logs").is_dir());
        let rolled: Vec<_> = fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("finance-buddy.log"))
            .collect();
        assert_eq!(rolled.len(), 1);
    }

    #[test]
    fn test_init_file_rejects_path_without_file_name() {
        assert!(init_file("info", Path::new("/")).is_err());
    }
}
