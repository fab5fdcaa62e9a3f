//! Topology store: the normalized network configuration graph
//!
//! This module handles:
//! - Topology: environments, zones, VLANs, firewalls, services and servers
//! - Loading saved files of any supported shape and saving the canonical form
//! - Validation of keys, scopes and generator prerequisites

pub mod builtin;
pub mod legacy;
pub mod loader;
pub mod query;
pub mod schema;
pub mod validator;

// Re-export commonly used types
pub use legacy::{normalize, parse_topology, RawTopology};
pub use loader::TopologyLoader;
pub use schema::{
    DebianSettings, Direction, Environment, Firewall, FirewallRuleRecord, FirewallScope, Meta,
    PortItem, Roles, RouteRecord, Server, Service, Topology, Vlan, VlanScope, Zone,
    DEFAULT_METRIC,
};
pub use validator::TopologyValidator;
