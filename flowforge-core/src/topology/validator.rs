//! Topology validation: prerequisites, unique keys and scope uniqueness

use super::schema::Topology;
use crate::address::is_valid_octet;
use crate::error::{Result, ValidationError};
use std::collections::HashSet;

pub struct TopologyValidator;

impl TopologyValidator {
    /// Validate the structural invariants of a topology
    pub fn validate(topology: &Topology) -> Result<()> {
        Self::check_unique_keys(topology)?;
        Self::check_scopes(topology)?;
        Self::report_dangling_references(topology);
        Ok(())
    }

    /// Check that the topology has everything the generator needs
    ///
    /// Reports every missing piece at once.
    pub fn check_prerequisites(topology: &Topology) -> Result<()> {
        let mut missing = Vec::new();

        if topology.envs.is_empty() {
            missing.push("environments");
        }
        if topology.zones.is_empty() {
            missing.push("zones");
        }
        if topology.vlans.is_empty() {
            missing.push("networks/VLANs");
        }
        if topology.services.is_empty() {
            missing.push("services");
        }
        if topology.servers.is_empty() {
            missing.push("servers");
        }

        let incomplete = topology.servers.iter().any(|s| {
            s.name.is_empty()
                || !s.octet_value().is_some_and(is_valid_octet)
                || s.envs.is_empty()
                || s.vlans.is_empty()
        });
        if incomplete {
            missing.push("server configuration (name/octet/environment/VLAN)");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::PrerequisitesMissing {
                missing: missing.join(", "),
            }
            .into())
        }
    }

    fn check_unique_keys(topology: &Topology) -> Result<()> {
        Self::unique("environment", topology.envs.iter().map(|e| e.tag.as_str()))?;
        Self::unique("VLAN", topology.vlans.iter().map(|v| v.name.as_str()))?;
        Self::unique("service", topology.services.iter().map(|s| s.name.as_str()))?;
        Self::unique("server", topology.servers.iter().map(|s| s.name.as_str()))?;
        Ok(())
    }

    fn unique<'a>(kind: &'static str, keys: impl Iterator<Item = &'a str>) -> Result<()> {
        let mut seen = HashSet::new();
        for key in keys {
            if !seen.insert(key) {
                return Err(ValidationError::DuplicateKey {
                    kind,
                    key: key.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// At most one scope per (env, zone) pair on each VLAN
    fn check_scopes(topology: &Topology) -> Result<()> {
        for vlan in &topology.vlans {
            let mut pairs = HashSet::new();
            for scope in &vlan.scopes {
                if !pairs.insert((scope.env_tag.as_str(), scope.zone_tag.as_str())) {
                    return Err(ValidationError::DuplicateScope {
                        vlan: vlan.name.clone(),
                        env_tag: scope.env_tag.clone(),
                        zone_tag: scope.zone_tag.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Dangling references are tolerated; they only ever fail to match
    fn report_dangling_references(topology: &Topology) {
        let env_tags: HashSet<&str> = topology.envs.iter().map(|e| e.tag.as_str()).collect();
        let zone_tags: HashSet<&str> = topology.zones.iter().map(|z| z.tag.as_str()).collect();

        for vlan in &topology.vlans {
            for scope in &vlan.scopes {
                if !env_tags.contains(scope.env_tag.as_str()) {
                    tracing::debug!("VLAN {} scope references unknown environment {}", vlan.name, scope.env_tag);
                }
                if !zone_tags.contains(scope.zone_tag.as_str()) {
                    tracing::debug!("VLAN {} scope references unknown zone {}", vlan.name, scope.zone_tag);
                }
            }
        }

        for server in &topology.servers {
            for vlan_name in &server.vlans {
                if topology.vlan(vlan_name).is_none() {
                    tracing::debug!("Server {} references unknown VLAN {}", server.name, vlan_name);
                }
            }
            for env_tag in &server.envs {
                if !env_tags.contains(env_tag.as_str()) {
                    tracing::debug!("Server {} references unknown environment {}", server.name, env_tag);
                }
            }
        }
    }
}
