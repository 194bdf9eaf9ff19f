use std::time::{Duration, SystemTime};

/// Restart-on-exit policy.
///
/// The window cap guards against a service that dies instantly on every
/// launch; once exceeded, the service is left unregistered until the next
/// explicit start-all or manual intervention.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    /// Whether automatic restart is enabled
    pub enabled: bool,
    /// Maximum number of restarts within the time window
    pub max_restarts: usize,
    /// Time window for counting restarts (in seconds)
    pub time_window_secs: u64,
}

impl RestartPolicy {
    pub fn new() -> Self {
        Self {
            enabled: true,
            max_restarts: 10,
            time_window_secs: 60,
        }
    }

    pub fn from_config(enabled: bool, max_restarts: usize, time_window_secs: u64) -> Self {
        Self {
            enabled,
            max_restarts,
            time_window_secs,
        }
    }

    /// Check if a restart should be attempted given the restart history
    pub fn should_restart(&self, tracker: &RestartTracker) -> bool {
        if !self.enabled {
            return false;
        }

        tracker.count_recent_restarts(self.time_window_secs) < self.max_restarts
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Restart history for one service name.
///
/// Kept by the supervisor, keyed by name, so history survives instance
/// replacement: a restart produces a fresh instance record, not a
/// resurrected one.
#[derive(Debug, Clone, Default)]
pub struct RestartTracker {
    restart_times: Vec<SystemTime>,
}

impl RestartTracker {
    pub fn new() -> Self {
        Self {
            restart_times: Vec::new(),
        }
    }

    /// Record a restart attempt
    pub fn record_restart(&mut self) {
        self.restart_times.push(SystemTime::now());
    }

    /// Total number of recorded restarts
    pub fn restart_count(&self) -> usize {
        self.restart_times.len()
    }

    /// Count restarts within the specified time window (in seconds)
    pub fn count_recent_restarts(&self, window_secs: u64) -> usize {
        let now = SystemTime::now();
        let window = Duration::from_secs(window_secs);

        self.restart_times
            .iter()
            .filter(|&&time| {
                now.duration_since(time)
                    .map(|d| d < window)
                    .unwrap_or(false)
            })
            .count()
    }

    /// Time of the last restart, if any
    pub fn last_restart_time(&self) -> Option<SystemTime> {
        self.restart_times.last().copied()
    }

    /// Drop records that fell out of the window
    pub fn prune_old_restarts(&mut self, window_secs: u64) {
        let now = SystemTime::now();
        let window = Duration::from_secs(window_secs);

        self.restart_times.retain(|&time| {
            now.duration_since(time)
                .map(|d| d < window)
                .unwrap_or(false)
        });
    }
}
