use apimaster::config::{LauncherConfig, MasterConfig};
use apimaster::process::types::ServiceSpec;
use apimaster::process::Supervisor;
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;

fn test_config(root: &Path, command: &str, stop_timeout_secs: u64) -> MasterConfig {
    MasterConfig {
        launcher: LauncherConfig {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), command.to_string()],
        },
        poll_interval_secs: 1,
        stop_timeout_secs,
        log_dir: root.join("logs"),
        ..MasterConfig::default()
    }
}

fn make_spec(root: &Path, name: &str, port: u16) -> ServiceSpec {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("app.py"), "# entry").unwrap();

    ServiceSpec {
        name: name.to_string(),
        dir,
        entry: "app.py".to_string(),
        host: "127.0.0.1".to_string(),
        port,
    }
}

#[tokio::test]
async fn test_shutdown_terminates_all_instances() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), "sleep 30", 2);

    let specs = vec![
        make_spec(temp_dir.path(), "auction_api", 9101),
        make_spec(temp_dir.path(), "bid_api", 9102),
        make_spec(temp_dir.path(), "userapi", 9103),
    ];

    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;
    assert_eq!(supervisor.registry().len(), 3);

    supervisor.shutdown_all().await;
    assert!(supervisor.registry().is_empty());
}

#[tokio::test]
async fn test_sigterm_is_enough_for_cooperative_service() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), "sleep 30", 5);

    let specs = vec![make_spec(temp_dir.path(), "auction_api", 9111)];

    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;

    // sleep dies on SIGTERM, so shutdown must finish well inside the
    // grace period instead of waiting it out
    let start = Instant::now();
    supervisor.shutdown_all().await;
    assert!(start.elapsed().as_secs() < 5);
    assert!(supervisor.registry().is_empty());
}

#[tokio::test]
async fn test_stubborn_service_is_force_killed() {
    let temp_dir = TempDir::new().unwrap();
    // Ignores SIGTERM, must be escalated to SIGKILL after the grace period
    let config = test_config(temp_dir.path(), "trap '' TERM; sleep 30", 1);

    let specs = vec![make_spec(temp_dir.path(), "bid_api", 9121)];

    let mut supervisor = Supervisor::new(config);
    supervisor.start_all(&specs).await;
    assert_eq!(supervisor.registry().len(), 1);

    let start = Instant::now();
    supervisor.shutdown_all().await;

    // Grace period of 1s, then the kill; either way nothing stays tracked
    assert!(start.elapsed().as_secs() < 10);
    assert!(supervisor.registry().is_empty());
}

#[tokio::test]
async fn test_shutdown_with_empty_registry_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), "sleep 30", 2);

    let mut supervisor = Supervisor::new(config);
    supervisor.shutdown_all().await;
    assert!(supervisor.registry().is_empty());
}
