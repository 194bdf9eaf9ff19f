// Process module - service lifecycle management

pub mod monitor;
pub mod registry;
pub mod restart;
pub mod spawner;
pub mod supervisor;
pub mod types;

pub use monitor::InstanceMonitor;
pub use registry::ServiceRegistry;
pub use restart::{RestartPolicy, RestartTracker};
pub use spawner::{launch, LaunchOutcome, SkipReason};
pub use supervisor::Supervisor;
pub use types::{InstanceStats, RunningInstance, ServiceSpec, ServiceState};
