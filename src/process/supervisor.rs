use crate::config::MasterConfig;
use crate::error::{MasterError, Result};
use crate::logs::capture_output;
use crate::process::monitor::InstanceMonitor;
use crate::process::registry::ServiceRegistry;
use crate::process::restart::{RestartPolicy, RestartTracker};
use crate::process::spawner::{launch, LaunchOutcome};
use crate::process::types::{RunningInstance, ServiceSpec};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// The single control flow owning all supervisor state.
///
/// Discovery hands it the specs; it launches them, polls liveness on a fixed
/// interval, relaunches services that exit, and tears everything down when
/// the shutdown channel fires. Signal handlers only ever send on that
/// channel, they never touch the registry.
pub struct Supervisor {
    config: MasterConfig,
    registry: ServiceRegistry,
    monitor: InstanceMonitor,
    restart_policy: RestartPolicy,
    trackers: HashMap<String, RestartTracker>,
}

impl Supervisor {
    pub fn new(config: MasterConfig) -> Self {
        let restart_policy = RestartPolicy::from_config(
            config.autorestart,
            config.max_restarts,
            config.restart_window_secs,
        );

        Self {
            config,
            registry: ServiceRegistry::new(),
            monitor: InstanceMonitor::new(),
            restart_policy,
            trackers: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.registry
    }

    /// Launch every spec in discovery order.
    ///
    /// Per-unit failures are contained: a skipped or failed launch leaves
    /// that unit absent from the registry and the rest proceed.
    pub async fn start_all(&mut self, specs: &[ServiceSpec]) {
        for spec in specs {
            if let Err(e) = self.start_service(spec).await {
                error!(service = %spec.name, "failed to launch service: {}", e);
            }
        }

        info!(
            "Started {} of {} discovered service(s)",
            self.registry.len(),
            specs.len()
        );
    }

    /// Launch one spec and register the instance.
    ///
    /// Returns Ok(false) for the non-fatal skip outcomes: name already
    /// tracked, port already held, or launch preconditions missing.
    async fn start_service(&mut self, spec: &ServiceSpec) -> Result<bool> {
        if self.registry.get(&spec.name).is_some() {
            warn!(service = %spec.name, "service already running, skipping launch");
            return Ok(false);
        }

        if let Some(holder) = self.registry.port_holder(spec.port) {
            warn!(
                service = %spec.name,
                port = spec.port,
                "port already held by {}, skipping launch",
                holder
            );
            return Ok(false);
        }

        match launch(spec, &self.config.launcher).await? {
            LaunchOutcome::Skipped(reason) => {
                warn!(service = %spec.name, "launch skipped: {}", reason);
                Ok(false)
            }
            LaunchOutcome::Launched(mut instance) => {
                if let Err(e) = capture_output(&spec.name, &self.config.log_dir, &mut instance.child)
                {
                    warn!(service = %spec.name, "failed to capture service output: {}", e);
                }

                instance.mark_running();
                info!(
                    service = %spec.name,
                    pid = instance.stats.pid,
                    host = %spec.host,
                    port = spec.port,
                    "service started"
                );

                self.registry.insert(instance)?;
                Ok(true)
            }
        }
    }

    /// One liveness pass over every tracked instance.
    ///
    /// An exited instance is removed immediately; if the restart policy
    /// allows, the same spec is relaunched synchronously and the fresh
    /// instance registered. Survivors get their stats sampled.
    pub async fn poll_tick(&mut self) {
        for name in self.registry.names() {
            let exit_status = match self.registry.get_mut(&name) {
                Some(instance) => match instance.child.try_wait() {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(service = %name, "liveness check failed: {}", e);
                        None
                    }
                },
                None => None,
            };

            let Some(status) = exit_status else {
                continue;
            };

            if let Some(mut instance) = self.registry.remove(&name) {
                instance.mark_exited();
                warn!(service = %name, %status, "service exited unexpectedly");
                self.maybe_restart(instance.spec.clone()).await;
            }
        }

        self.monitor.sample(self.registry.iter_mut());
    }

    /// Relaunch an exited service if the restart policy allows it
    async fn maybe_restart(&mut self, spec: ServiceSpec) {
        let name = spec.name.clone();

        let allowed = {
            let tracker = self.trackers.entry(name.clone()).or_default();
            tracker.prune_old_restarts(self.restart_policy.time_window_secs);
            self.restart_policy.should_restart(tracker)
        };

        if !allowed {
            if self.restart_policy.enabled {
                warn!(
                    service = %name,
                    "restart limit exceeded, leaving service unregistered"
                );
            } else {
                debug!(service = %name, "autorestart disabled, not relaunching");
            }
            return;
        }

        match launch(&spec, &self.config.launcher).await {
            Ok(LaunchOutcome::Launched(mut instance)) => {
                let tracker = self.trackers.entry(name.clone()).or_default();
                tracker.record_restart();
                instance.stats.restarts = tracker.restart_count();
                instance.stats.last_restart = tracker.last_restart_time();

                if let Err(e) = capture_output(&name, &self.config.log_dir, &mut instance.child) {
                    warn!(service = %name, "failed to capture service output: {}", e);
                }

                instance.mark_running();
                info!(
                    service = %name,
                    pid = instance.stats.pid,
                    restarts = instance.stats.restarts,
                    "service restarted"
                );

                if let Err(e) = self.registry.insert(instance) {
                    error!(service = %name, "failed to register restarted service: {}", e);
                }
            }
            Ok(LaunchOutcome::Skipped(reason)) => {
                warn!(service = %name, "restart skipped: {}", reason);
            }
            Err(e) => {
                error!(service = %name, "restart failed: {}", e);
            }
        }
    }

    /// Poll on the configured interval until the shutdown channel fires,
    /// then stop every instance and return.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        info!(
            "Supervisor loop started (poll interval: {}s)",
            self.config.poll_interval_secs
        );

        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; consume it so the loop
        // sleeps a full interval before the first poll
        interval.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping all services");
                    break;
                }
                _ = interval.tick() => {
                    self.poll_tick().await;
                }
            }
        }

        self.shutdown_all().await;
        info!("Supervisor stopped");

        Ok(())
    }

    /// Stop every tracked instance, graceful first then forced.
    ///
    /// Attempted for every instance even if one fails; termination failures
    /// are logged, never propagated. The registry is empty afterwards.
    pub async fn shutdown_all(&mut self) {
        let instances = self.registry.drain();

        info!("Stopping {} running service(s)", instances.len());

        for mut instance in instances {
            if let Err(e) = self.stop_instance(&mut instance).await {
                error!(service = %instance.name(), "failed to stop service: {}", e);
            }
        }
    }

    /// SIGTERM, bounded wait, then SIGKILL on expiry
    async fn stop_instance(&self, instance: &mut RunningInstance) -> Result<()> {
        instance.mark_terminating();

        // Already gone between the last poll and now
        if let Ok(Some(status)) = instance.child.try_wait() {
            debug!(service = %instance.name(), %status, "service already exited");
            instance.mark_terminated();
            return Ok(());
        }

        let name = instance.name().to_string();
        let pid = Pid::from_raw(instance.stats.pid as i32);

        info!(service = %name, pid = instance.stats.pid, "stopping service with SIGTERM");

        signal::kill(pid, Signal::SIGTERM).map_err(|e| {
            MasterError::StopError(name.clone(), format!("Failed to send SIGTERM: {}", e))
        })?;

        let timeout = self.config.stop_timeout();

        match tokio::time::timeout(timeout, instance.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(service = %name, %status, "service exited gracefully");
            }
            Ok(Err(e)) => {
                return Err(MasterError::StopError(name, format!("Wait failed: {}", e)));
            }
            Err(_) => {
                warn!(
                    service = %name,
                    "service did not exit within {:?}, sending SIGKILL",
                    timeout
                );
                signal::kill(pid, Signal::SIGKILL).map_err(|e| {
                    MasterError::StopError(
                        name.clone(),
                        format!("Failed to send SIGKILL after timeout: {}", e),
                    )
                })?;
            }
        }

        let _ = instance.child.wait().await;
        instance.mark_terminated();

        info!(service = %name, "service stopped");

        Ok(())
    }
}
