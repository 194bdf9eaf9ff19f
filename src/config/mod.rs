use crate::error::{MasterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Supervisor configuration: discovery settings, launch settings and the
/// static port table mapping logical service names to TCP ports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Bind host passed to every service
    #[serde(default = "default_host")]
    pub host: String,

    /// Entry-point marker file that identifies a service directory
    #[serde(default = "default_marker")]
    pub marker: String,

    /// How the entry point is invoked
    #[serde(default)]
    pub launcher: LauncherConfig,

    /// Seconds between liveness polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to wait for graceful exit before force kill
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    /// Whether to relaunch services that exit unexpectedly
    #[serde(default = "default_autorestart")]
    pub autorestart: bool,

    /// Maximum restarts per service within the restart window
    #[serde(default = "default_max_restarts")]
    pub max_restarts: usize,

    /// Restart counting window (in seconds)
    #[serde(default = "default_restart_window")]
    pub restart_window_secs: u64,

    /// Directory for the supervisor log file and per-service output logs
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Service name to TCP port. Names without an entry are skipped at
    /// discovery time; ports must be pairwise distinct.
    #[serde(default = "default_ports")]
    pub ports: HashMap<String, u16>,
}

/// Command template used to start one service.
///
/// Template arguments may reference `{name}`, `{module}`, `{host}` and
/// `{port}`; they are substituted at launch time. The default invokes the
/// entry module through uvicorn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Program to execute
    #[serde(default = "default_program")]
    pub program: String,

    /// Argument template
    #[serde(default = "default_launcher_args")]
    pub args: Vec<String>,
}

// Default value functions for serde
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_marker() -> String {
    "app.py".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_stop_timeout() -> u64 {
    5
}

fn default_autorestart() -> bool {
    true
}

fn default_max_restarts() -> usize {
    10
}

fn default_restart_window() -> u64 {
    60
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_launcher_args() -> Vec<String> {
    vec![
        "-m".to_string(),
        "uvicorn".to_string(),
        "{module}:app".to_string(),
        "--host".to_string(),
        "{host}".to_string(),
        "--port".to_string(),
        "{port}".to_string(),
    ]
}

/// Port table of the reference deployment
fn default_ports() -> HashMap<String, u16> {
    HashMap::from([
        ("auction_api".to_string(), 5000),
        ("bid_api".to_string(), 8000),
        ("linkedin_api".to_string(), 8002),
        ("companydetailLinkedin".to_string(), 8003),
        ("userapi".to_string(), 8006),
    ])
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            marker: default_marker(),
            launcher: LauncherConfig::default(),
            poll_interval_secs: default_poll_interval(),
            stop_timeout_secs: default_stop_timeout(),
            autorestart: default_autorestart(),
            max_restarts: default_max_restarts(),
            restart_window_secs: default_restart_window(),
            log_dir: default_log_dir(),
            ports: default_ports(),
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_launcher_args(),
        }
    }
}

impl LauncherConfig {
    /// Substitute template placeholders for one service
    pub fn render_args(&self, name: &str, module: &str, host: &str, port: u16) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{name}", name)
                    .replace("{module}", module)
                    .replace("{host}", host)
                    .replace("{port}", &port.to_string())
            })
            .collect()
    }
}

impl MasterConfig {
    /// Load configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<MasterConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MasterError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let config: MasterConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| MasterError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| MasterError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(MasterError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(MasterError::ConfigValidationError(
                "host must not be empty".to_string(),
            ));
        }

        if self.marker.is_empty() {
            return Err(MasterError::ConfigValidationError(
                "marker must not be empty".to_string(),
            ));
        }

        if self.launcher.program.is_empty() {
            return Err(MasterError::ConfigValidationError(
                "launcher program must not be empty".to_string(),
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(MasterError::ConfigValidationError(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }

        if self.stop_timeout_secs == 0 {
            return Err(MasterError::ConfigValidationError(
                "stop_timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.max_restarts == 0 {
            return Err(MasterError::ConfigValidationError(
                "max_restarts must be at least 1".to_string(),
            ));
        }

        // Ports must be nonzero and pairwise distinct
        let mut seen: HashMap<u16, &str> = HashMap::new();
        for (name, port) in &self.ports {
            if *port == 0 {
                return Err(MasterError::ConfigValidationError(format!(
                    "Port for service '{}' must be nonzero",
                    name
                )));
            }
            if let Some(other) = seen.insert(*port, name.as_str()) {
                return Err(MasterError::ConfigValidationError(format!(
                    "Port {} assigned to both '{}' and '{}'",
                    port, other, name
                )));
            }
        }

        Ok(())
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get stop timeout as Duration
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}
