//! Plugin registry (C3): scans `cattackles_dir` for manifests and
//! publishes an in-memory snapshot lookups are served from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::models::{ManifestFile, PluginManifest};

/// Errors raised by the registry. Per-manifest parse failures are logged
/// and the manifest is skipped rather than surfaced as an error here —
/// only a directory that exists but cannot be read at all is fatal, and
/// that check lives in `Config::validate`, not here: a missing
/// `cattackles_dir` is a normal zero-plugin scan.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The cattackles directory could not be read despite existing
    /// (permission denied, not a directory, etc).
    #[error("cannot read cattackles directory {path}: {source}")]
    Unreadable {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Scans a directory of `<plugin>/cattackle.toml` manifests and serves
/// lookups against the most recent successful scan.
pub struct PluginRegistry {
    cattackles_dir: PathBuf,
    snapshot: RwLock<Arc<HashMap<String, PluginManifest>>>,
}

impl PluginRegistry {
    /// Creates a registry over `cattackles_dir`, with an empty snapshot
    /// until the first `scan()`.
    pub fn new(cattackles_dir: impl Into<PathBuf>) -> Self {
        Self {
            cattackles_dir: cattackles_dir.into(),
            snapshot: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Rescans `cattackles_dir`: every immediate subdirectory containing
    /// a `cattackle.toml` is parsed and validated; failures are logged
    /// and that plugin is omitted, not fatal to the scan. A missing
    /// directory yields zero plugins, logged at `warn`. The new snapshot
    /// replaces the old one atomically (rescans are idempotent: a plugin
    /// removed from disk disappears from the map; no running session is
    /// torn down). Returns the count of successfully loaded plugins.
    pub async fn scan(&self) -> usize {
        let entries = match std::fs::read_dir(&self.cattackles_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(dir = %self.cattackles_dir.display(), "cattackles directory not found");
                *self.snapshot.write().await = Arc::new(HashMap::new());
                return 0;
            }
            Err(e) => {
                error!(dir = %self.cattackles_dir.display(), error = %e, "failed to read cattackles directory");
                *self.snapshot.write().await = Arc::new(HashMap::new());
                return 0;
            }
        };

        let mut loaded = HashMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let manifest_path = path.join("cattackle.toml");
            if !manifest_path.is_file() {
                continue;
            }
            match load_manifest(&manifest_path) {
                Ok(manifest) => {
                    loaded.insert(manifest.name.clone(), manifest);
                }
                Err(e) => {
                    error!(
                        path = %manifest_path.display(),
                        error = %e,
                        "failed to load cattackle manifest"
                    );
                }
            }
        }

        let count = loaded.len();
        info!(count, dir = %self.cattackles_dir.display(), "cattackle registry scan complete");
        *self.snapshot.write().await = Arc::new(loaded);
        count
    }

    /// Exact `(plugin, command)` lookup.
    pub async fn find_by_plugin_and_command(&self, plugin: &str, command: &str) -> Option<PluginManifest> {
        let snapshot = self.snapshot.read().await;
        let manifest = snapshot.get(plugin)?;
        manifest.commands.contains_key(command).then(|| manifest.clone())
    }

    /// First plugin (by ascending name) advertising `command`, used as the
    /// fallback when the caller did not disambiguate.
    pub async fn find_by_command(&self, command: &str) -> Option<(String, PluginManifest)> {
        let snapshot = self.snapshot.read().await;
        let mut names: Vec<&String> = snapshot.keys().collect();
        names.sort();
        for name in names {
            let manifest = &snapshot[name];
            if manifest.commands.contains_key(command) {
                return Some((name.clone(), manifest.clone()));
            }
        }
        None
    }

    /// A single plugin's manifest, for the worker-session manager's
    /// reconnect path — always the current manifest, so a plugin
    /// rescanned with new connection details reconnects using them.
    pub async fn manifest(&self, plugin: &str) -> Option<PluginManifest> {
        self.snapshot.read().await.get(plugin).cloned()
    }

    /// Snapshot of every loaded manifest, for admin listing.
    pub async fn get_all(&self) -> Vec<PluginManifest> {
        self.snapshot.read().await.values().cloned().collect()
    }

    /// The directory this registry scans, for diagnostics.
    pub fn cattackles_dir(&self) -> &Path {
        &self.cattackles_dir
    }
}

fn load_manifest(path: &Path) -> RegistryResult<PluginManifest> {
    let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ManifestFile = toml::from_str(&contents).map_err(|e| RegistryError::Unreadable {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    Ok(file.cattackle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, plugin: &str, name: &str, command: &str) {
        let plugin_dir = dir.join(plugin);
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(
            plugin_dir.join("cattackle.toml"),
            format!(
                r#"
[cattackle]
name = "{name}"
version = "0.1.0"
description = "test plugin"

[cattackle.commands.{command}]
description = "a command"

[cattackle.mcp]
transport = "stdio"
command = "python"
args = []
"#
            ),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn scan_loads_valid_manifests() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "echo", "echo", "echo");
        write_manifest(dir.path(), "admin", "admin", "status");

        let registry = PluginRegistry::new(dir.path());
        assert_eq!(registry.scan().await, 2);
        let mut names: Vec<String> = registry.get_all().await.into_iter().map(|m| m.name).collect();
        names.sort();
        assert_eq!(names, vec!["admin".to_string(), "echo".to_string()]);
    }

    #[tokio::test]
    async fn missing_directory_yields_zero_plugins() {
        let registry = PluginRegistry::new("/does/not/exist/at/all");
        assert_eq!(registry.scan().await, 0);
        assert!(registry.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_toml_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "echo", "echo", "echo");
        let broken_dir = dir.path().join("broken");
        std::fs::create_dir_all(&broken_dir).unwrap();
        std::fs::write(broken_dir.join("cattackle.toml"), "not valid toml {{{").unwrap();

        let registry = PluginRegistry::new(dir.path());
        assert_eq!(registry.scan().await, 1);
    }

    #[tokio::test]
    async fn exact_and_fallback_lookups() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "echo", "echo", "echo");
        let registry = PluginRegistry::new(dir.path());
        registry.scan().await;

        assert!(registry.find_by_plugin_and_command("echo", "echo").await.is_some());
        assert!(registry.find_by_plugin_and_command("echo", "nope").await.is_none());
        let (plugin, _) = registry.find_by_command("echo").await.unwrap();
        assert_eq!(plugin, "echo");
        assert!(registry.find_by_command("nope").await.is_none());
    }

    #[tokio::test]
    async fn rescans_drop_removed_plugins() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "echo", "echo", "echo");
        let registry = PluginRegistry::new(dir.path());
        assert_eq!(registry.scan().await, 1);

        std::fs::remove_dir_all(dir.path().join("echo")).unwrap();
        assert_eq!(registry.scan().await, 0);
        assert!(registry.get_all().await.is_empty());
    }
}
