use crate::config::MasterConfig;
use crate::error::{MasterError, Result};
use crate::process::types::ServiceSpec;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Produce the ordered set of service specs to run.
///
/// Walks the root's subdirectories (nested included) for the entry-point
/// marker file, derives each unit's logical name from the containing
/// directory's basename and looks its port up in the configured table.
/// Units without a port entry are excluded with a warning; so is a second
/// directory carrying an already-discovered name. Results are sorted by
/// name so launch order is deterministic.
///
/// A missing root directory is the single fatal outcome.
pub fn discover(root: &Path, config: &MasterConfig) -> Result<Vec<ServiceSpec>> {
    if !root.is_dir() {
        return Err(MasterError::RootNotFound(root.to_path_buf()));
    }

    let mut dirs = Vec::new();
    collect_service_dirs(root, &config.marker, &mut dirs);
    dirs.sort();

    let mut seen: HashSet<String> = HashSet::new();
    let mut specs = Vec::new();

    for dir in dirs {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            continue;
        };

        if !seen.insert(name.clone()) {
            warn!(
                service = %name,
                dir = %dir.display(),
                "duplicate service name, skipping directory"
            );
            continue;
        }

        match config.ports.get(&name) {
            Some(&port) => {
                debug!(service = %name, port, dir = %dir.display(), "discovered service");
                specs.push(ServiceSpec {
                    name,
                    dir,
                    entry: config.marker.clone(),
                    host: config.host.clone(),
                    port,
                });
            }
            None => {
                warn!(service = %name, "no predefined port for service, skipping");
            }
        }
    }

    specs.sort_by(|a, b| a.name.cmp(&b.name));

    info!(
        "Discovered {} service(s): {}",
        specs.len(),
        specs
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(specs)
}

/// Recursively collect directories containing the marker file.
///
/// Unreadable subdirectories are skipped with a warning; only the root
/// itself is a precondition.
fn collect_service_dirs(dir: &Path, marker: &str, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), "failed to read directory: {}", e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        // Hidden directories are never service units
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(true)
        {
            continue;
        }

        if path.join(marker).is_file() {
            out.push(path.clone());
        }

        collect_service_dirs(&path, marker, out);
    }
}
