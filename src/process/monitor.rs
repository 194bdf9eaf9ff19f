use crate::process::types::{RunningInstance, ServiceState};
use sysinfo::{Pid, ProcessRefreshKind, System};

/// Samples cpu/memory usage for tracked instances via sysinfo.
///
/// Sampling is purely observational: liveness decisions are made from the
/// owned child handle, never from here. An instance that vanished from the
/// system between polls simply keeps its last sample.
pub struct InstanceMonitor {
    system: System,
}

impl InstanceMonitor {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// Refresh system process info and record cpu/memory for every running
    /// instance
    pub fn sample<'a, I>(&mut self, instances: I)
    where
        I: Iterator<Item = &'a mut RunningInstance>,
    {
        self.system.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );

        for instance in instances {
            if instance.state != ServiceState::Running {
                continue;
            }

            let sys_pid = Pid::from_u32(instance.stats.pid);
            if let Some(process) = self.system.process(sys_pid) {
                instance.stats.cpu_usage = process.cpu_usage();
                instance.stats.memory_usage = process.memory();

                tracing::debug!(
                    service = instance.name(),
                    pid = instance.stats.pid,
                    cpu = instance.stats.cpu_usage,
                    memory = instance.stats.memory_usage,
                    "sampled instance stats"
                );
            }
        }
    }
}

impl Default for InstanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}
