//! Lookups over a topology by key
//!
//! References between entities are plain string keys. A key that matches
//! nothing is a normal "no match" result, never an error.

use super::schema::{Environment, Server, Service, Topology, Vlan};
use std::collections::HashSet;

impl Topology {
    pub fn env(&self, tag: &str) -> Option<&Environment> {
        self.envs.iter().find(|e| e.tag == tag)
    }

    pub fn vlan(&self, name: &str) -> Option<&Vlan> {
        self.vlans.iter().find(|v| v.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn server_mut(&mut self, name: &str) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| s.name == name)
    }

    /// Sorted names of servers that are members of the environment
    pub fn servers_in_env(&self, env_tag: &str) -> Vec<String> {
        if env_tag.is_empty() {
            return vec![];
        }
        let mut names: Vec<String> = self
            .servers
            .iter()
            .filter(|s| s.in_env(env_tag))
            .map(|s| s.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Sorted names of VLANs with at least one scope in the environment
    pub fn vlans_in_env(&self, env_tag: &str) -> Vec<String> {
        if env_tag.is_empty() {
            return vec![];
        }
        let mut names: Vec<String> = self
            .vlans
            .iter()
            .filter(|v| v.in_env(env_tag))
            .map(|v| v.name.clone())
            .collect();
        names.sort();
        names
    }

    /// VLANs that may be used as the next-hop network in an environment
    ///
    /// A VLAN qualifies when one of its scopes is in the environment and in a
    /// zone that some firewall covers for that environment. When no firewall
    /// covers the environment at all, every VLAN in the environment qualifies.
    pub fn via_vlan_candidates(&self, env_tag: &str) -> Vec<String> {
        if env_tag.is_empty() {
            return vec![];
        }

        let covered_zones: HashSet<&str> = self
            .firewalls
            .iter()
            .flat_map(|f| &f.scopes)
            .filter(|s| s.env_tag == env_tag && !s.zone_tag.is_empty())
            .map(|s| s.zone_tag.as_str())
            .collect();

        if covered_zones.is_empty() {
            return self.vlans_in_env(env_tag);
        }

        let mut names: Vec<String> = self
            .vlans
            .iter()
            .filter(|v| {
                v.scopes
                    .iter()
                    .any(|s| s.env_tag == env_tag && covered_zones.contains(s.zone_tag.as_str()))
            })
            .map(|v| v.name.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use crate::topology::schema::{Firewall, FirewallScope, Server, Topology, Vlan, VlanScope};

    fn vlan(name: &str, scopes: &[(&str, &str)]) -> Vlan {
        Vlan {
            name: name.to_string(),
            cidr: "10.0.0.0/24".to_string(),
            scopes: scopes
                .iter()
                .map(|(env, zone)| VlanScope {
                    env_tag: env.to_string(),
                    zone_tag: zone.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn create_test_topology() -> Topology {
        let mut web = Server::new("web01");
        web.envs = vec!["PRD".to_string()];
        let mut app = Server::new("app01");
        app.envs = vec!["PRD".to_string(), "DEV".to_string()];
        let mut dev = Server::new("dev01");
        dev.envs = vec!["DEV".to_string()];

        Topology {
            vlans: vec![
                vlan("Web-Net", &[("PRD", "DMZ")]),
                vlan("App-Net", &[("PRD", "CORE"), ("DEV", "CORE")]),
                vlan("Mgmt-Net", &[("PRD", "MGMT")]),
            ],
            servers: vec![web, app, dev],
            ..Default::default()
        }
    }

    #[test]
    fn test_env_filters() {
        let topology = create_test_topology();
        assert_eq!(topology.servers_in_env("PRD"), vec!["app01", "web01"]);
        assert_eq!(topology.servers_in_env("DEV"), vec!["app01", "dev01"]);
        assert_eq!(topology.vlans_in_env("DEV"), vec!["App-Net"]);
        assert!(topology.servers_in_env("").is_empty());
    }

    #[test]
    fn test_via_candidates_without_firewalls() {
        let topology = create_test_topology();
        assert_eq!(
            topology.via_vlan_candidates("PRD"),
            vec!["App-Net", "Mgmt-Net", "Web-Net"]
        );
    }

    #[test]
    fn test_via_candidates_limited_to_firewalled_zones() {
        let mut topology = create_test_topology();
        topology.firewalls.push(Firewall {
            name: "fw-core".to_string(),
            scopes: vec![
                FirewallScope {
                    env_tag: "PRD".to_string(),
                    zone_tag: "CORE".to_string(),
                },
                FirewallScope {
                    env_tag: "PRD".to_string(),
                    zone_tag: "DMZ".to_string(),
                },
            ],
        });

        assert_eq!(topology.via_vlan_candidates("PRD"), vec!["App-Net", "Web-Net"]);
        // No firewall covers DEV, so all DEV VLANs remain eligible
        assert_eq!(topology.via_vlan_candidates("DEV"), vec!["App-Net"]);
        assert!(topology.via_vlan_candidates("").is_empty());
    }
}
