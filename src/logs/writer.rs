use crate::error::{MasterError, Result};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::fs::File as TokioFile;
use tokio::io::AsyncWriteExt;

/// Default maximum log file size before rotation (10MB)
const DEFAULT_MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Which output stream of a service a writer persists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    /// File name suffix for this stream
    pub fn suffix(&self) -> &'static str {
        match self {
            LogStream::Stdout => "out",
            LogStream::Stderr => "err",
        }
    }
}

/// Appends timestamped lines of one service output stream to a log file,
/// rotating the file once it grows past the size limit
pub struct ServiceLogWriter {
    path: PathBuf,
    file: TokioFile,
    max_size: u64,
    size: u64,
}

impl ServiceLogWriter {
    /// Open (or create) the log file for one service stream
    pub async fn new(log_dir: &Path, service: &str, stream: LogStream) -> Result<Self> {
        Self::with_max_size(log_dir, service, stream, DEFAULT_MAX_LOG_SIZE).await
    }

    /// Open a writer with a custom rotation threshold
    pub async fn with_max_size(
        log_dir: &Path,
        service: &str,
        stream: LogStream,
        max_size: u64,
    ) -> Result<Self> {
        tokio::fs::create_dir_all(log_dir)
            .await
            .map_err(|e| MasterError::LogError(format!("Failed to create log directory: {}", e)))?;

        let path = log_dir.join(format!("{}-{}.log", service, stream.suffix()));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| MasterError::LogFileError(format!("Failed to open service log: {}", e)))?;

        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        let file = TokioFile::from_std(file);

        Ok(Self {
            path,
            file,
            max_size,
            size,
        })
    }

    /// Append one timestamped line, rotating first if the file is full
    pub async fn write_line(&mut self, data: &[u8]) -> Result<()> {
        if self.size >= self.max_size {
            self.rotate().await?;
        }

        let entry = format_entry(&Local::now(), data);

        self.file
            .write_all(&entry)
            .await
            .map_err(|e| MasterError::LogError(format!("Failed to write to log: {}", e)))?;
        self.file
            .flush()
            .await
            .map_err(|e| MasterError::LogError(format!("Failed to flush log: {}", e)))?;

        self.size += entry.len() as u64;

        Ok(())
    }

    /// Rename the current file with a timestamp suffix and start a fresh one
    async fn rotate(&mut self) -> Result<()> {
        let timestamp = Local::now().format("%Y%m%d-%H%M%S").to_string();

        let parent = self
            .path
            .parent()
            .ok_or_else(|| MasterError::LogRotationError("Invalid log file path".to_string()))?;
        let file_stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MasterError::LogRotationError("Invalid log file name".to_string()))?;

        let rotated_path = parent.join(format!("{}-{}.log", file_stem, timestamp));

        tokio::fs::rename(&self.path, &rotated_path)
            .await
            .map_err(|e| MasterError::LogRotationError(format!("Failed to rotate log: {}", e)))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                MasterError::LogFileError(format!("Failed to reopen log after rotation: {}", e))
            })?;

        self.file = TokioFile::from_std(file);
        self.size = 0;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }
}

/// Format: [YYYY-MM-DD HH:MM:SS.mmm] <data>\n
fn format_entry(timestamp: &DateTime<Local>, data: &[u8]) -> Vec<u8> {
    let timestamp_str = timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    let mut entry = Vec::with_capacity(timestamp_str.len() + 3 + data.len());

    entry.extend_from_slice(b"[");
    entry.extend_from_slice(timestamp_str.as_bytes());
    entry.extend_from_slice(b"] ");
    entry.extend_from_slice(data);

    if !data.ends_with(b"\n") {
        entry.push(b'\n');
    }

    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_writer() {
        let temp_dir = TempDir::new().unwrap();

        let writer = ServiceLogWriter::new(temp_dir.path(), "bid_api", LogStream::Stdout)
            .await
            .unwrap();

        assert_eq!(writer.max_size(), DEFAULT_MAX_LOG_SIZE);
        assert!(writer.path().exists());
        assert!(writer.path().ends_with("bid_api-out.log"));
    }

    #[tokio::test]
    async fn test_write_line_is_timestamped() {
        let temp_dir = TempDir::new().unwrap();

        let mut writer = ServiceLogWriter::new(temp_dir.path(), "bid_api", LogStream::Stderr)
            .await
            .unwrap();
        writer.write_line(b"connection refused").await.unwrap();

        let content = tokio::fs::read_to_string(writer.path()).await.unwrap();
        assert!(content.contains("connection refused"));
        assert!(content.starts_with("["));
        assert!(writer.path().ends_with("bid_api-err.log"));
    }

    #[tokio::test]
    async fn test_rotation() {
        let temp_dir = TempDir::new().unwrap();

        let mut writer =
            ServiceLogWriter::with_max_size(temp_dir.path(), "bid_api", LogStream::Stdout, 100)
                .await
                .unwrap();

        for _ in 0..10 {
            writer.write_line(b"a reasonably long log line").await.unwrap();
        }

        let log_files: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("bid_api") && n.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        assert!(
            log_files.len() >= 2,
            "Expected at least 2 log files, found {}",
            log_files.len()
        );
    }

    #[tokio::test]
    async fn test_size_tracking() {
        let temp_dir = TempDir::new().unwrap();

        let mut writer = ServiceLogWriter::new(temp_dir.path(), "bid_api", LogStream::Stdout)
            .await
            .unwrap();

        let initial_size = writer.size();
        writer.write_line(b"some output").await.unwrap();
        assert!(writer.size() > initial_size);
    }
}
