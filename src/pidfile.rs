// Pid file management for the supervisor process

use crate::error::{MasterError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default pid file location
const DEFAULT_PID_FILE: &str = "/tmp/apimaster.pid";

/// Records the supervisor's own pid for operator tooling
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Create a pid file manager with the default path
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PID_FILE),
        }
    }

    /// Create a pid file manager with a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write the current process pid to the file
    pub fn write(&self) -> Result<()> {
        let pid = std::process::id();
        fs::write(&self.path, pid.to_string())
            .map_err(|e| MasterError::PidFileError(format!("Failed to write pid file: {}", e)))?;
        Ok(())
    }

    /// Read the pid from the file
    pub fn read(&self) -> Result<u32> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| MasterError::PidFileError(format!("Failed to read pid file: {}", e)))?;

        content
            .trim()
            .parse::<u32>()
            .map_err(|e| MasterError::PidFileError(format!("Invalid pid in file: {}", e)))
    }

    /// Check if the pid file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove the pid file
    pub fn remove(&self) -> Result<()> {
        if self.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| MasterError::PidFileError(format!("Failed to remove pid file: {}", e)))?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}
