//! Canonical topology schema
//!
//! This is the normalized shape produced by [`super::legacy`] at load time
//! and written back on save. Field names follow the JSON file format.

use crate::protocol::Protocol;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metric used for generated routes when none is given
pub const DEFAULT_METRIC: u32 = 100;

/// Complete topology: the graph every artifact is derived from
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub debian: DebianSettings,
    #[serde(default)]
    pub envs: Vec<Environment>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub vlans: Vec<Vlan>,
    #[serde(default)]
    pub firewalls: Vec<Firewall>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub servers: Vec<Server>,
    /// Provisioning settings, carried through untouched
    #[serde(default)]
    pub provisioning: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default = "default_app")]
    pub app: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_tagline")]
    pub tagline: String,
}

pub(crate) fn default_app() -> String {
    "FlowForge LE".to_string()
}

pub(crate) fn default_version() -> String {
    "1.0.0".to_string()
}

pub(crate) fn default_tagline() -> String {
    "Where network flows are forged.".to_string()
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            app: default_app(),
            version: default_version(),
            tagline: default_tagline(),
        }
    }
}

/// Debian host settings used by the interface naming scripts
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebianSettings {
    #[serde(default = "default_udev_path")]
    pub udev_path: String,
    #[serde(default = "default_true")]
    pub disable_predictable: bool,
}

pub(crate) fn default_udev_path() -> String {
    "/etc/udev/rules.d/10-flowforge-ifnames.rules".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DebianSettings {
    fn default() -> Self {
        Self {
            udev_path: default_udev_path(),
            disable_predictable: true,
        }
    }
}

/// A deployment tier such as PRD or DEV
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,
    /// Join key used by every other entity
    pub tag: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub comment: String,
}

/// A security grouping that exists within a set of environments
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,
    pub tag: String,
    #[serde(default)]
    pub env_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    pub name: String,
    #[serde(default)]
    pub vlan_id: String,
    #[serde(default)]
    pub cidr: String,
    #[serde(default)]
    pub iface: String,
    #[serde(default)]
    pub scopes: Vec<VlanScope>,
}

impl Vlan {
    /// Whether any scope binds this VLAN to the environment
    pub fn in_env(&self, env_tag: &str) -> bool {
        self.scopes.iter().any(|s| s.env_tag == env_tag)
    }
}

/// Binding of a VLAN to one (environment, zone) pair with its gateways
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanScope {
    pub env_tag: String,
    pub zone_tag: String,
    #[serde(default)]
    pub gw_default: String,
    #[serde(default)]
    pub gw_fallback: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Firewall {
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<FirewallScope>,
}

/// An (environment, zone) pair covered by a firewall boundary
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallScope {
    pub env_tag: String,
    pub zone_tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub port_items: Vec<PortItem>,
}

/// One protocol/port combination offered by a service
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PortItem {
    #[serde(serialize_with = "Protocol::serialize_upper")]
    pub proto: Protocol,
    /// Port, port list or range ("22", "80,443", "20000-20100")
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub name: String,
    #[serde(default)]
    pub os: String,
    /// Host octet as entered; see [`Server::octet_value`]
    #[serde(default)]
    pub octet: String,
    #[serde(default)]
    pub envs: Vec<String>,
    /// VLAN memberships in assignment order; the first one is the default egress
    #[serde(default)]
    pub vlans: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteRecord>,
    #[serde(default)]
    pub firewall_rules: Vec<FirewallRuleRecord>,
    #[serde(default)]
    pub roles: Roles,
}

impl Server {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            os: "debian".to_string(),
            octet: String::new(),
            envs: vec![],
            vlans: vec![],
            services: vec![],
            routes: vec![],
            firewall_rules: vec![],
            roles: Roles::default(),
        }
    }

    /// Numeric octet, if the stored value parses as one
    pub fn octet_value(&self) -> Option<u32> {
        self.octet.trim().parse().ok()
    }

    pub fn in_env(&self, env_tag: &str) -> bool {
        self.envs.iter().any(|e| e == env_tag)
    }

    pub fn in_vlan(&self, vlan_name: &str) -> bool {
        self.vlans.iter().any(|v| v == vlan_name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Roles {
    #[serde(default)]
    pub dns: bool,
    #[serde(default)]
    pub ntp: bool,
}

/// A route persisted on a server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub dst: String,
    pub via_vlan: String,
    pub gateway: String,
    pub dev: String,
    pub metric: u32,
    pub env_tag: String,
    #[serde(default)]
    pub comment: String,
}

/// Traffic direction of a host firewall rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// nftables chain the rule belongs to
    pub const fn chain(self) -> &'static str {
        match self {
            Direction::In => "input",
            Direction::Out => "output",
        }
    }
}

/// A host firewall rule persisted on a server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleRecord {
    pub dir: Direction,
    pub src: String,
    pub dst: String,
    pub proto: Protocol,
    #[serde(default)]
    pub ports: String,
    pub env_tag: String,
    #[serde(default)]
    pub comment: String,
}
