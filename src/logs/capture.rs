use crate::error::{MasterError, Result};
use crate::logs::writer::{LogStream, ServiceLogWriter};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;

/// Route a freshly spawned child's stdout/stderr to the service's log files.
///
/// Takes both pipes off the child and spawns one background reader task per
/// stream. Each task owns its writer and ends on pipe EOF, so a restarted
/// instance simply gets fresh tasks appending to the same files.
pub fn capture_output(service: &str, log_dir: &Path, child: &mut Child) -> Result<()> {
    let stdout = child.stdout.take().ok_or_else(|| {
        MasterError::LogError(format!("No stdout pipe available for service {}", service))
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        MasterError::LogError(format!("No stderr pipe available for service {}", service))
    })?;

    tokio::spawn(read_task(
        service.to_string(),
        log_dir.to_path_buf(),
        LogStream::Stdout,
        BufReader::new(stdout),
    ));
    tokio::spawn(read_task(
        service.to_string(),
        log_dir.to_path_buf(),
        LogStream::Stderr,
        BufReader::new(stderr),
    ));

    Ok(())
}

/// Background task reading one stream line by line until EOF
async fn read_task<R>(service: String, log_dir: PathBuf, stream: LogStream, mut reader: BufReader<R>)
where
    R: AsyncRead + Unpin,
{
    let mut writer = match ServiceLogWriter::new(&log_dir, &service, stream).await {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(service = %service, "failed to open service log: {}", e);
            return;
        }
    };

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if let Err(e) = writer.write_line(line.as_bytes()).await {
                    tracing::warn!(service = %service, "failed to write service log: {}", e);
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(service = %service, "failed to read service output: {}", e);
                break;
            }
        }
    }
}
