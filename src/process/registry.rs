use crate::error::{MasterError, Result};
use crate::process::types::RunningInstance;
use std::collections::HashMap;

/// The supervisor state: logical service name to at most one live instance.
///
/// A name maps to an instance only while its process is tracked as alive;
/// the poll loop removes the entry as soon as an exit is detected. Only the
/// single supervisor flow touches the registry, so no locking is needed.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    instances: HashMap<String, RunningInstance>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            instances: HashMap::new(),
        }
    }

    /// Track a freshly launched instance.
    ///
    /// Rejects the insert if the name is already registered or the port is
    /// already held by another tracked instance; a conflicting launch must
    /// never be silently allowed.
    pub fn insert(&mut self, instance: RunningInstance) -> Result<()> {
        if self.instances.contains_key(instance.name()) {
            return Err(MasterError::ServiceAlreadyRegistered(
                instance.name().to_string(),
            ));
        }

        if let Some(holder) = self.port_holder(instance.port()) {
            return Err(MasterError::PortConflict(
                instance.port(),
                holder.to_string(),
            ));
        }

        self.instances.insert(instance.name().to_string(), instance);
        Ok(())
    }

    /// Name of the tracked instance holding `port`, if any
    pub fn port_holder(&self, port: u16) -> Option<&str> {
        self.instances
            .values()
            .find(|i| i.port() == port)
            .map(|i| i.name())
    }

    pub fn get(&self, name: &str) -> Option<&RunningInstance> {
        self.instances.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RunningInstance> {
        self.instances.get_mut(name)
    }

    /// Release an instance from tracking
    pub fn remove(&mut self, name: &str) -> Option<RunningInstance> {
        self.instances.remove(name)
    }

    /// Registered names, sorted so iteration order is deterministic
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.instances.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RunningInstance> {
        self.instances.values_mut()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Remove and return every instance, leaving the registry empty
    pub fn drain(&mut self) -> Vec<RunningInstance> {
        let mut drained: Vec<RunningInstance> =
            self.instances.drain().map(|(_, inst)| inst).collect();
        drained.sort_by(|a, b| a.spec.name.cmp(&b.spec.name));
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::types::ServiceSpec;
    use std::path::PathBuf;

    async fn test_instance(name: &str, port: u16) -> RunningInstance {
        let spec = ServiceSpec {
            name: name.to_string(),
            dir: PathBuf::from("/tmp"),
            entry: "app.py".to_string(),
            host: "127.0.0.1".to_string(),
            port,
        };

        let child = tokio::process::Command::new("/bin/sleep")
            .arg("10")
            .spawn()
            .expect("Failed to spawn process");
        let pid = child.id().expect("Failed to get PID");

        RunningInstance::new(spec, child, pid)
    }

    async fn cleanup(registry: &mut ServiceRegistry) {
        for mut instance in registry.drain() {
            let _ = instance.child.kill().await;
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.is_empty());

        registry.insert(test_instance("bid_api", 8000).await).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("bid_api").is_some());
        assert!(registry.get("userapi").is_none());

        cleanup(&mut registry).await;
    }

    #[tokio::test]
    async fn test_insert_duplicate_name_rejected() {
        let mut registry = ServiceRegistry::new();
        registry.insert(test_instance("bid_api", 8000).await).unwrap();

        let result = registry.insert(test_instance("bid_api", 8001).await);
        assert!(matches!(
            result,
            Err(MasterError::ServiceAlreadyRegistered(_))
        ));
        assert_eq!(registry.len(), 1);

        cleanup(&mut registry).await;
    }

    #[tokio::test]
    async fn test_insert_port_conflict_rejected() {
        let mut registry = ServiceRegistry::new();
        registry.insert(test_instance("bid_api", 8000).await).unwrap();

        let result = registry.insert(test_instance("userapi", 8000).await);
        assert!(matches!(result, Err(MasterError::PortConflict(8000, _))));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.port_holder(8000), Some("bid_api"));

        cleanup(&mut registry).await;
    }

    #[tokio::test]
    async fn test_remove() {
        let mut registry = ServiceRegistry::new();
        registry.insert(test_instance("bid_api", 8000).await).unwrap();

        let mut removed = registry.remove("bid_api").expect("instance should exist");
        assert!(registry.is_empty());
        assert!(registry.remove("bid_api").is_none());
        assert_eq!(registry.port_holder(8000), None);

        let _ = removed.child.kill().await;
    }

    #[tokio::test]
    async fn test_names_sorted() {
        let mut registry = ServiceRegistry::new();
        registry.insert(test_instance("userapi", 8006).await).unwrap();
        registry.insert(test_instance("bid_api", 8000).await).unwrap();
        registry.insert(test_instance("auction_api", 5000).await).unwrap();

        assert_eq!(registry.names(), vec!["auction_api", "bid_api", "userapi"]);

        cleanup(&mut registry).await;
    }

    #[tokio::test]
    async fn test_drain_empties_registry() {
        let mut registry = ServiceRegistry::new();
        registry.insert(test_instance("bid_api", 8000).await).unwrap();
        registry.insert(test_instance("userapi", 8006).await).unwrap();

        let mut drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());

        for instance in &mut drained {
            let _ = instance.child.kill().await;
        }
    }
}
