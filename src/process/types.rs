use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::process::Child;

/// Immutable descriptor of one launchable service unit, produced by
/// discovery and never mutated afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Logical name, unique across all specs
    pub name: String,

    /// Working directory the unit runs in
    pub dir: PathBuf,

    /// Entry-point file name inside `dir`
    pub entry: String,

    /// Bind host passed to the unit
    pub host: String,

    /// Bind port, unique across all specs
    pub port: u16,
}

impl ServiceSpec {
    /// Full path to the entry-point file
    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(&self.entry)
    }

    /// Module name derived from the entry file ("app.py" -> "app")
    pub fn module(&self) -> String {
        Path::new(&self.entry)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.entry.clone())
    }
}

/// Lifecycle of a running instance.
///
/// `Launching` is transient within launch. From `Running` the only
/// transitions are to `Exited` (detected by the poll loop) or `Terminating`
/// (shutdown), and `Terminating` always ends in `Terminated`. A restart
/// produces a fresh instance record, never a resurrected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    Launching,
    Running,
    Exited,
    Terminating,
    Terminated,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Launching => write!(f, "launching"),
            ServiceState::Running => write!(f, "running"),
            ServiceState::Exited => write!(f, "exited"),
            ServiceState::Terminating => write!(f, "terminating"),
            ServiceState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Per-instance runtime statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStats {
    pub pid: u32,
    pub started_at: SystemTime,
    pub restarts: usize,
    pub last_restart: Option<SystemTime>,
    pub cpu_usage: f32,
    pub memory_usage: u64,
}

impl InstanceStats {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            started_at: SystemTime::now(),
            restarts: 0,
            last_restart: None,
            cpu_usage: 0.0,
            memory_usage: 0,
        }
    }

    pub fn uptime(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.started_at)
            .unwrap_or(Duration::from_secs(0))
    }
}

/// A spec paired with a live child process.
///
/// The child handle is exclusively owned by the supervisor and only ever
/// borrowed, so no other component can wait on or signal the process.
#[derive(Debug)]
pub struct RunningInstance {
    pub spec: ServiceSpec,
    pub state: ServiceState,
    pub child: Child,
    pub stats: InstanceStats,
}

impl RunningInstance {
    pub fn new(spec: ServiceSpec, child: Child, pid: u32) -> Self {
        Self {
            spec,
            state: ServiceState::Launching,
            child,
            stats: InstanceStats::new(pid),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn port(&self) -> u16 {
        self.spec.port
    }

    pub fn mark_running(&mut self) {
        self.state = ServiceState::Running;
    }

    pub fn mark_exited(&mut self) {
        self.state = ServiceState::Exited;
    }

    pub fn mark_terminating(&mut self) {
        self.state = ServiceState::Terminating;
    }

    pub fn mark_terminated(&mut self) {
        self.state = ServiceState::Terminated;
    }
}
