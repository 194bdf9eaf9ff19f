use crate::config::LauncherConfig;
use crate::error::{MasterError, Result};
use crate::process::types::{RunningInstance, ServiceSpec};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Why a launch was skipped without producing an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The service working directory does not exist
    MissingDir(PathBuf),
    /// The entry-point file does not exist
    MissingEntry(PathBuf),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingDir(path) => {
                write!(f, "directory not found: {}", path.display())
            }
            SkipReason::MissingEntry(path) => {
                write!(f, "entry file not found: {}", path.display())
            }
        }
    }
}

/// Result of a launch attempt.
///
/// Missing launch preconditions are a skip, not an error: the unit is simply
/// absent from the registry and the supervisor carries on.
#[derive(Debug)]
pub enum LaunchOutcome {
    Launched(RunningInstance),
    Skipped(SkipReason),
}

/// Launch one service spec as an independent child process.
///
/// The launcher template is rendered with the spec's module, host and port,
/// and the command runs in the spec's working directory with stdout/stderr
/// piped so output stays attributable to the unit. The returned instance is
/// in the `launching` state; no readiness handshake is performed, so the
/// bound port may not be listening yet.
pub async fn launch(spec: &ServiceSpec, launcher: &LauncherConfig) -> Result<LaunchOutcome> {
    if !spec.dir.is_dir() {
        return Ok(LaunchOutcome::Skipped(SkipReason::MissingDir(
            spec.dir.clone(),
        )));
    }

    let entry_path = spec.entry_path();
    if !entry_path.is_file() {
        return Ok(LaunchOutcome::Skipped(SkipReason::MissingEntry(entry_path)));
    }

    let args = launcher.render_args(&spec.name, &spec.module(), &spec.host, spec.port);

    let mut command = Command::new(&launcher.program);
    command
        .args(&args)
        .current_dir(&spec.dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = command.spawn().map_err(|e| {
        MasterError::SpawnError(format!("Failed to spawn service '{}': {}", spec.name, e))
    })?;

    let pid = child.id().ok_or_else(|| {
        MasterError::SpawnError(format!("Failed to get PID for service '{}'", spec.name))
    })?;

    Ok(LaunchOutcome::Launched(RunningInstance::new(
        spec.clone(),
        child,
        pid,
    )))
}
