//! Core library for FlowForge
//!
//! Derives static routes, nftables host firewall rules and CSV summaries
//! from a network topology, and merges them back into the topology.

pub mod address;
pub mod apply;
pub mod endpoint;
pub mod error;
pub mod firewall;
pub mod flow;
pub mod format;
pub mod gateway;
pub mod generator;
pub mod protocol;
pub mod routes;
pub mod topology;

pub use apply::{apply_artifacts, ApplyReport};
pub use endpoint::{resolve_endpoint, Endpoint, EndpointKind, EndpointRef};
pub use error::{ForgeError, Result, ValidationError};
pub use firewall::{FirewallMap, ServiceEntry};
pub use generator::{generate, Artifacts, GenerateRequest};
pub use protocol::Protocol;
pub use routes::{RouteItem, RouteMap};
pub use topology::{Topology, TopologyLoader, TopologyValidator};
