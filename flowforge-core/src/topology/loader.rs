//! Topology file loading and saving

use super::builtin;
use super::legacy::parse_topology;
use super::schema::Topology;
use crate::error::{ForgeError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct TopologyLoader;

impl TopologyLoader {
    /// Load and normalize a topology file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Topology> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ForgeError::TopologyLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let topology = parse_topology(&contents)?;
        tracing::debug!(
            "Loaded topology from {:?}: {} environments, {} VLANs, {} servers",
            path,
            topology.envs.len(),
            topology.vlans.len(),
            topology.servers.len()
        );
        Ok(topology)
    }

    /// Internal default topology with empty collections
    pub fn load_builtin() -> Topology {
        builtin::get_builtin().clone()
    }

    /// Load from the first available source
    /// Priority: explicit path > configured path > built-in
    ///
    /// An explicit path must exist. A configured path that does not exist
    /// falls through to the built-in topology.
    pub fn load_with_priority(explicit: Option<&Path>, configured: Option<&Path>) -> Result<Topology> {
        if let Some(path) = explicit {
            tracing::debug!("Loading explicit topology from {:?}", path);
            return Self::load_from_file(path);
        }

        if let Some(path) = configured {
            if path.exists() {
                tracing::debug!("Loading configured topology from {:?}", path);
                return Self::load_from_file(path);
            }
            tracing::debug!("Configured topology {:?} not found, using built-in default", path);
        }

        Ok(Self::load_builtin())
    }

    /// Write the topology in canonical form
    pub fn save_to_file<P: AsRef<Path>>(topology: &Topology, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(topology)?;
        json.push('\n');

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ForgeError::TopologySave {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, json).map_err(|source| ForgeError::TopologySave {
            path: PathBuf::from(path),
            source,
        })?;
        tracing::debug!("Saved topology to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LEGACY_TOPOLOGY: &str = r#"{
        "envs": ["PRD"],
        "vlans": [{"name": "App-Net", "cidr": "10.1.1.0/24", "iface": "eth1",
                   "gateways": {"PRD": {"default": "10.1.1.1"}}}],
        "servers": [{"name": "app01", "octet": 11, "envs": ["PRD"], "vlans": ["App-Net"]}]
    }"#;

    #[test]
    fn test_load_normalizes_legacy_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("topology.json");
        fs::write(&path, LEGACY_TOPOLOGY).unwrap();

        let topology = TopologyLoader::load_from_file(&path).unwrap();
        assert_eq!(topology.envs[0].tag, "PRD");
        assert_eq!(topology.vlans[0].scopes[0].gw_default, "10.1.1.1");
        assert_eq!(topology.servers[0].octet, "11");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("legacy.json");
        let target = dir.path().join("out/canonical.json");
        fs::write(&source, LEGACY_TOPOLOGY).unwrap();

        let topology = TopologyLoader::load_from_file(&source).unwrap();
        TopologyLoader::save_to_file(&topology, &target).unwrap();

        let saved = fs::read_to_string(&target).unwrap();
        assert!(saved.contains("\"scopes\""));
        assert!(!saved.contains("\"gateways\""));
        assert_eq!(TopologyLoader::load_from_file(&target).unwrap(), topology);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        let result = TopologyLoader::load_with_priority(Some(path.as_path()), None);
        assert!(matches!(result, Err(ForgeError::TopologyLoad { .. })));
    }

    #[test]
    fn test_missing_configured_file_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        let topology = TopologyLoader::load_with_priority(None, Some(path.as_path())).unwrap();
        assert_eq!(topology, TopologyLoader::load_builtin());
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let result = TopologyLoader::load_from_file(&path);
        assert!(matches!(result, Err(ForgeError::TopologyParse(_))));
    }
}
