//! Endpoint resolution: which servers take part in a flow and at which address

use crate::address::{derive_host_ip, is_valid_octet};
use crate::error::ValidationError;
use crate::topology::{Server, Topology, Vlan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conventional name of the management network
///
/// Preferred for a server's primary address when no routing hint applies.
pub const MANAGEMENT_VLAN: &str = "Cfg-Net";

/// Address used when a server endpoint has no derivable IP
pub const SERVER_IP_PLACEHOLDER: &str = "<server-ip>/32";

/// What a user-selected endpoint value names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Server,
    Vlan,
}

impl EndpointKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            EndpointKind::Server => "server",
            EndpointKind::Vlan => "vlan",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unresolved endpoint selection, written `server:<name>` or `vlan:<name>`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointRef {
    pub kind: EndpointKind,
    pub name: String,
}

impl EndpointRef {
    pub fn server(name: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Server,
            name: name.into(),
        }
    }

    pub fn vlan(name: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Vlan,
            name: name.into(),
        }
    }
}

impl FromStr for EndpointRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidEndpoint {
            value: s.to_string(),
        };
        let (kind, name) = s.split_once(':').ok_or_else(invalid)?;
        let kind = match kind.trim().to_ascii_lowercase().as_str() {
            "server" => EndpointKind::Server,
            "vlan" => EndpointKind::Vlan,
            _ => return Err(invalid()),
        };
        Ok(Self {
            kind,
            name: name.trim().to_string(),
        })
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// A resolved endpoint
#[derive(Debug, Clone)]
pub enum Endpoint<'a> {
    /// A single server
    Server(&'a Server),
    /// Every server of the VLAN within the selected environment
    Vlan {
        vlan: &'a Vlan,
        servers: Vec<&'a Server>,
    },
}

impl<'a> Endpoint<'a> {
    pub fn kind(&self) -> EndpointKind {
        match self {
            Endpoint::Server(_) => EndpointKind::Server,
            Endpoint::Vlan { .. } => EndpointKind::Vlan,
        }
    }

    /// Member servers that receive routes and rules for this endpoint
    pub fn servers(&self) -> &[&'a Server] {
        match self {
            Endpoint::Server(server) => std::slice::from_ref(server),
            Endpoint::Vlan { servers, .. } => servers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// A whole network
    Cidr,
    /// A single host (/32)
    Host,
}

/// Address a route or rule points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpec {
    pub kind: AddressKind,
    pub value: String,
}

/// Resolve a selection into concrete member servers
///
/// Returns `None` when the named server or VLAN does not exist. A VLAN with
/// no members in the environment resolves to an endpoint with no servers.
pub fn resolve_endpoint<'a>(
    topology: &'a Topology,
    kind: EndpointKind,
    name: &str,
    env_tag: &str,
) -> Option<Endpoint<'a>> {
    match kind {
        EndpointKind::Server => topology.server(name).map(Endpoint::Server),
        EndpointKind::Vlan => {
            let vlan = topology.vlan(name)?;
            let servers = topology
                .servers
                .iter()
                .filter(|s| s.in_vlan(name) && s.in_env(env_tag))
                .collect::<Vec<_>>();
            tracing::debug!(
                "VLAN endpoint {} in {} has {} member server(s)",
                name,
                env_tag,
                servers.len()
            );
            Some(Endpoint::Vlan { vlan, servers })
        }
    }
}

/// Primary IPv4 address of a server
///
/// Candidates, in order, each used only if it yields an address:
/// 1. the hinted via-VLAN, if the server is a member
/// 2. the management VLAN ([`MANAGEMENT_VLAN`]), if the server is a member
/// 3. the server's first assigned VLAN
pub fn server_primary_ip(topology: &Topology, server: &Server, via_vlan_hint: &str) -> Option<String> {
    let octet = server.octet_value().filter(|o| is_valid_octet(*o))?;
    let address_on = |vlan_name: &str| {
        topology
            .vlan(vlan_name)
            .and_then(|vlan| derive_host_ip(&vlan.cidr, octet))
    };

    let hint = via_vlan_hint.trim();
    if !hint.is_empty() && server.in_vlan(hint) {
        if let Some(ip) = address_on(hint) {
            return Some(ip);
        }
    }

    if server.in_vlan(MANAGEMENT_VLAN) {
        if let Some(ip) = address_on(MANAGEMENT_VLAN) {
            return Some(ip);
        }
    }

    server.vlans.first().and_then(|first| address_on(first))
}

/// Address specs an endpoint stands for
///
/// Every endpoint kind currently yields exactly one spec.
pub fn endpoint_specs(topology: &Topology, endpoint: &Endpoint<'_>, via_vlan_hint: &str) -> Vec<AddressSpec> {
    match endpoint {
        Endpoint::Vlan { vlan, .. } => vec![AddressSpec {
            kind: AddressKind::Cidr,
            value: vlan.cidr.clone(),
        }],
        Endpoint::Server(server) => vec![AddressSpec {
            kind: AddressKind::Host,
            value: host_address(topology, server, via_vlan_hint),
        }],
    }
}

/// Single address string for an endpoint: the VLAN CIDR or the server's /32
pub fn endpoint_addr(topology: &Topology, endpoint: &Endpoint<'_>, via_vlan_hint: &str) -> String {
    match endpoint {
        Endpoint::Vlan { vlan, .. } => vlan.cidr.clone(),
        Endpoint::Server(server) => host_address(topology, server, via_vlan_hint),
    }
}

fn host_address(topology: &Topology, server: &Server, via_vlan_hint: &str) -> String {
    match server_primary_ip(topology, server, via_vlan_hint) {
        Some(ip) => format!("{}/32", ip),
        None => {
            tracing::warn!("No address derivable for server {}, using placeholder", server.name);
            SERVER_IP_PLACEHOLDER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Vlan, VlanScope};

    fn vlan(name: &str, cidr: &str) -> Vlan {
        Vlan {
            name: name.to_string(),
            cidr: cidr.to_string(),
            iface: "eth0".to_string(),
            scopes: vec![VlanScope {
                env_tag: "PRD".to_string(),
                zone_tag: "CORE".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn server(name: &str, octet: &str, envs: &[&str], vlans: &[&str]) -> Server {
        let mut s = Server::new(name);
        s.octet = octet.to_string();
        s.envs = envs.iter().map(|e| e.to_string()).collect();
        s.vlans = vlans.iter().map(|v| v.to_string()).collect();
        s
    }

    fn create_test_topology() -> Topology {
        Topology {
            vlans: vec![
                vlan("App-Net", "10.1.1.0/24"),
                vlan("Cfg-Net", "10.9.9.0/24"),
                vlan("Db-Net", "10.1.2.0/24"),
            ],
            servers: vec![
                server("app01", "11", &["PRD"], &["App-Net", "Cfg-Net"]),
                server("app02", "12", &["PRD"], &["App-Net"]),
                server("app-dev", "13", &["DEV"], &["App-Net"]),
                server("db01", "21", &["PRD"], &["Db-Net", "Cfg-Net"]),
                server("broken", "300", &["PRD"], &["App-Net"]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_endpoint_ref() {
        assert_eq!("server:app01".parse::<EndpointRef>().unwrap(), EndpointRef::server("app01"));
        assert_eq!("VLAN:Db-Net".parse::<EndpointRef>().unwrap(), EndpointRef::vlan("Db-Net"));
        assert!("app01".parse::<EndpointRef>().is_err());
        assert!("host:app01".parse::<EndpointRef>().is_err());
        assert_eq!(EndpointRef::vlan("Db-Net").to_string(), "vlan:Db-Net");
    }

    #[test]
    fn test_resolve_server() {
        let topology = create_test_topology();
        let ep = resolve_endpoint(&topology, EndpointKind::Server, "app01", "PRD").unwrap();
        assert_eq!(ep.kind(), EndpointKind::Server);
        assert_eq!(ep.servers().len(), 1);
        assert_eq!(ep.servers()[0].name, "app01");
        assert!(resolve_endpoint(&topology, EndpointKind::Server, "nope", "PRD").is_none());
    }

    #[test]
    fn test_vlan_members_filtered_by_env() {
        let topology = create_test_topology();
        let ep = resolve_endpoint(&topology, EndpointKind::Vlan, "App-Net", "PRD").unwrap();
        let names: Vec<&str> = ep.servers().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["app01", "app02", "broken"]);
        assert!(!names.contains(&"app-dev"));
        assert!(resolve_endpoint(&topology, EndpointKind::Vlan, "Ghost-Net", "PRD").is_none());
    }

    #[test]
    fn test_primary_ip_precedence() {
        let topology = create_test_topology();
        let app01 = topology.server("app01").unwrap();
        let db01 = topology.server("db01").unwrap();

        // Hint wins when the server is a member
        assert_eq!(server_primary_ip(&topology, app01, "App-Net").as_deref(), Some("10.1.1.11"));
        // Hint not a member: management VLAN before first VLAN
        assert_eq!(server_primary_ip(&topology, db01, "App-Net").as_deref(), Some("10.9.9.21"));
        // No hint: management VLAN
        assert_eq!(server_primary_ip(&topology, app01, "").as_deref(), Some("10.9.9.11"));
        // No hint, no management VLAN: first VLAN
        let app02 = topology.server("app02").unwrap();
        assert_eq!(server_primary_ip(&topology, app02, "").as_deref(), Some("10.1.1.12"));
    }

    #[test]
    fn test_invalid_octet_yields_placeholder() {
        let topology = create_test_topology();
        let broken = topology.server("broken").unwrap();
        assert_eq!(server_primary_ip(&topology, broken, "App-Net"), None);

        let ep = Endpoint::Server(broken);
        assert_eq!(endpoint_addr(&topology, &ep, "App-Net"), SERVER_IP_PLACEHOLDER);
    }

    #[test]
    fn test_endpoint_addresses() {
        let topology = create_test_topology();
        let vlan_ep = resolve_endpoint(&topology, EndpointKind::Vlan, "Db-Net", "PRD").unwrap();
        assert_eq!(endpoint_addr(&topology, &vlan_ep, ""), "10.1.2.0/24");
        assert_eq!(
            endpoint_specs(&topology, &vlan_ep, ""),
            vec![AddressSpec {
                kind: AddressKind::Cidr,
                value: "10.1.2.0/24".to_string()
            }]
        );

        let srv_ep = resolve_endpoint(&topology, EndpointKind::Server, "app01", "PRD").unwrap();
        let specs = endpoint_specs(&topology, &srv_ep, "App-Net");
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].kind, AddressKind::Host);
        assert_eq!(specs[0].value, "10.1.1.11/32");
    }
}
