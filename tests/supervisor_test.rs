use apimaster::config::{LauncherConfig, MasterConfig};
use apimaster::discovery::discover;
use apimaster::process::Supervisor;
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;
use tokio::time::{sleep, Duration};

fn test_config(root: &Path, ports: &[(&str, u16)]) -> MasterConfig {
    MasterConfig {
        launcher: LauncherConfig {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
        },
        poll_interval_secs: 1,
        stop_timeout_secs: 2,
        log_dir: root.join("logs"),
        ports: ports
            .iter()
            .map(|(name, port)| (name.to_string(), *port))
            .collect::<HashMap<String, u16>>(),
        ..MasterConfig::default()
    }
}

fn add_service_dir(root: &Path, name: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("app.py"), "# entry").unwrap();
}

#[tokio::test]
async fn test_discover_launch_crash_restart_shutdown() {
    // Scenario: config table {A: 9001, B: 9002}, marker files for A and B
    let temp_dir = TempDir::new().unwrap();
    add_service_dir(temp_dir.path(), "service_a");
    add_service_dir(temp_dir.path(), "service_b");

    let config = test_config(temp_dir.path(), &[("service_a", 9001), ("service_b", 9002)]);

    // Discovery yields specs for both names
    let specs = discover(temp_dir.path(), &config).unwrap();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].name, "service_a");
    assert_eq!(specs[0].port, 9001);
    assert_eq!(specs[1].name, "service_b");
    assert_eq!(specs[1].port, 9002);

    // Launch both
    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;
    assert_eq!(supervisor.registry().len(), 2);

    let original_pid = supervisor
        .registry()
        .get("service_a")
        .unwrap()
        .stats
        .pid;

    // Simulate A's process dying
    {
        let instance = supervisor.registry_mut().get_mut("service_a").unwrap();
        instance.child.kill().await.unwrap();
    }
    sleep(Duration::from_millis(100)).await;

    // The poll detects the exit and, with restart enabled, relaunches A as
    // a fresh instance on the same port
    supervisor.poll_tick().await;
    assert_eq!(supervisor.registry().len(), 2);

    let restarted = supervisor.registry().get("service_a").unwrap();
    assert_ne!(restarted.stats.pid, original_pid);
    assert_eq!(restarted.port(), 9001);
    assert_eq!(restarted.stats.restarts, 1);
    assert!(restarted.stats.last_restart.is_some());

    // Shutdown leaves nothing tracked
    supervisor.shutdown_all().await;
    assert!(supervisor.registry().is_empty());
}

#[tokio::test]
async fn test_exited_instance_removed_without_restart() {
    let temp_dir = TempDir::new().unwrap();
    add_service_dir(temp_dir.path(), "service_a");
    add_service_dir(temp_dir.path(), "service_b");

    let mut config = test_config(temp_dir.path(), &[("service_a", 9011), ("service_b", 9012)]);
    config.autorestart = false;

    let specs = discover(temp_dir.path(), &config).unwrap();
    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;
    assert_eq!(supervisor.registry().len(), 2);

    {
        let instance = supervisor.registry_mut().get_mut("service_a").unwrap();
        instance.child.kill().await.unwrap();
    }
    sleep(Duration::from_millis(100)).await;

    supervisor.poll_tick().await;

    // A is gone, B survives
    assert_eq!(supervisor.registry().len(), 1);
    assert!(supervisor.registry().get("service_a").is_none());
    assert!(supervisor.registry().get("service_b").is_some());

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_restart_limit_leaves_service_unregistered() {
    let temp_dir = TempDir::new().unwrap();
    add_service_dir(temp_dir.path(), "service_a");

    let mut config = test_config(temp_dir.path(), &[("service_a", 9021)]);
    config.max_restarts = 2;

    let specs = discover(temp_dir.path(), &config).unwrap();
    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;

    // Two restarts are allowed, the third crash exceeds the window cap
    for _ in 0..2 {
        {
            let instance = supervisor.registry_mut().get_mut("service_a").unwrap();
            instance.child.kill().await.unwrap();
        }
        sleep(Duration::from_millis(100)).await;
        supervisor.poll_tick().await;
        assert!(supervisor.registry().get("service_a").is_some());
    }

    {
        let instance = supervisor.registry_mut().get_mut("service_a").unwrap();
        instance.child.kill().await.unwrap();
    }
    sleep(Duration::from_millis(100)).await;
    supervisor.poll_tick().await;

    assert!(supervisor.registry().get("service_a").is_none());

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_unconfigured_name_never_reaches_registry() {
    // Scenario: directory "service_c" has a marker but no port entry
    let temp_dir = TempDir::new().unwrap();
    add_service_dir(temp_dir.path(), "service_a");
    add_service_dir(temp_dir.path(), "service_c");

    let config = test_config(temp_dir.path(), &[("service_a", 9031)]);

    let specs = discover(temp_dir.path(), &config).unwrap();
    assert_eq!(specs.len(), 1);
    assert!(specs.iter().all(|s| s.name != "service_c"));

    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;

    assert_eq!(supervisor.registry().len(), 1);
    assert!(supervisor.registry().get("service_c").is_none());

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_restart_skipped_when_entry_removed() {
    let temp_dir = TempDir::new().unwrap();
    add_service_dir(temp_dir.path(), "service_a");

    let config = test_config(temp_dir.path(), &[("service_a", 9041)]);
    let specs = discover(temp_dir.path(), &config).unwrap();

    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;
    assert_eq!(supervisor.registry().len(), 1);

    // Entry file disappears while the service runs; the relaunch must be a
    // clean skip, not a supervisor failure
    std::fs::remove_file(temp_dir.path().join("service_a").join("app.py")).unwrap();

    {
        let instance = supervisor.registry_mut().get_mut("service_a").unwrap();
        instance.child.kill().await.unwrap();
    }
    sleep(Duration::from_millis(100)).await;

    supervisor.poll_tick().await;
    assert!(supervisor.registry().is_empty());
}
