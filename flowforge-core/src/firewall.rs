//! Host firewall rule generation
//!
//! Each allowed flow needs an `out` rule on the sending servers and a
//! matching `in` rule on the receiving servers.

use crate::error::ValidationError;
use crate::flow::Flow;
use crate::protocol::Protocol;
use crate::topology::{Direction, FirewallRuleRecord, Server, Service, Topology};
use std::collections::BTreeMap;

/// Generated rules keyed by server name, append-only per server
pub type FirewallMap = BTreeMap<String, Vec<FirewallRuleRecord>>;

/// One service selected for a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub service_name: String,
    pub proto: Protocol,
    pub ports: String,
    pub comment: String,
}

impl ServiceEntry {
    /// Select one port item of a catalogue service
    ///
    /// Out-of-range indices are clamped to the last item. A service without
    /// port items selects TCP with no port match.
    pub fn from_catalog(service: &Service, index: usize) -> Self {
        let (proto, ports) = match service.port_items.len().checked_sub(1) {
            Some(last) => {
                let item = &service.port_items[index.min(last)];
                (item.proto, item.value.clone())
            }
            None => {
                tracing::debug!("Service {} has no port items, allowing TCP without ports", service.name);
                (Protocol::Tcp, String::new())
            }
        };

        let comment = if service.comment.is_empty() {
            service.name.clone()
        } else {
            format!("{} — {}", service.name, service.comment)
        };

        Self {
            service_name: service.name.clone(),
            proto,
            ports,
            comment,
        }
    }

    /// Look a service up by name and select one of its port items
    pub fn resolve(topology: &Topology, name: &str, index: usize) -> Result<Self, ValidationError> {
        let service = topology
            .service(name)
            .ok_or_else(|| ValidationError::UnknownService {
                service: name.to_string(),
            })?;
        Ok(Self::from_catalog(service, index))
    }
}

fn push_rules(
    rules: &mut FirewallMap,
    servers: &[&Server],
    dir: Direction,
    template: &FirewallRuleRecord,
) {
    for server in servers {
        rules
            .entry(server.name.clone())
            .or_default()
            .push(FirewallRuleRecord {
                dir,
                ..template.clone()
            });
    }
}

fn rule_template(
    src: &str,
    dst: &str,
    proto: Protocol,
    ports: &str,
    env_tag: &str,
    comment: &str,
) -> FirewallRuleRecord {
    FirewallRuleRecord {
        dir: Direction::Out,
        src: src.to_string(),
        dst: dst.to_string(),
        proto,
        ports: ports.to_string(),
        env_tag: env_tag.to_string(),
        comment: comment.to_string(),
    }
}

fn reverse_comment(comment: &str) -> String {
    if comment.is_empty() {
        "reverse".to_string()
    } else {
        format!("{} (reverse)", comment)
    }
}

/// `out` rules on the source servers and `in` rules on the destination
/// servers, one set per concrete protocol
pub fn build_firewall_items_forward(
    flow: &Flow<'_>,
    proto: Protocol,
    ports: &str,
    comment: &str,
) -> FirewallMap {
    let src_addr = flow.src_addr();
    let dst_addr = flow.dst_addr();
    let mut rules = FirewallMap::new();

    for &p in proto.expand() {
        let template = rule_template(&src_addr, &dst_addr, p, ports, flow.env_tag, comment);
        push_rules(&mut rules, flow.src.servers(), Direction::Out, &template);
        push_rules(&mut rules, flow.dst.servers(), Direction::In, &template);
    }

    rules
}

/// Forward rules plus the reverse flow with swapped addresses
pub fn build_firewall_items_bidirectional(
    flow: &Flow<'_>,
    proto: Protocol,
    ports: &str,
    comment: &str,
) -> FirewallMap {
    let src_addr = flow.src_addr();
    let dst_addr = flow.dst_addr();
    let back = reverse_comment(comment);
    let mut rules = FirewallMap::new();

    for &p in proto.expand() {
        let forward = rule_template(&src_addr, &dst_addr, p, ports, flow.env_tag, comment);
        push_rules(&mut rules, flow.src.servers(), Direction::Out, &forward);
        push_rules(&mut rules, flow.dst.servers(), Direction::In, &forward);

        let reverse = rule_template(&dst_addr, &src_addr, p, ports, flow.env_tag, &back);
        push_rules(&mut rules, flow.dst.servers(), Direction::Out, &reverse);
        push_rules(&mut rules, flow.src.servers(), Direction::In, &reverse);
    }

    rules
}

/// Rules for every selected service, merged without deduplication
pub fn build_firewall_for_services(
    flow: &Flow<'_>,
    entries: &[ServiceEntry],
    bidirectional: bool,
) -> FirewallMap {
    let mut merged = FirewallMap::new();

    for entry in entries {
        let comment = if entry.comment.is_empty() {
            entry.service_name.as_str()
        } else {
            entry.comment.as_str()
        };
        let rules = if bidirectional {
            build_firewall_items_bidirectional(flow, entry.proto, &entry.ports, comment)
        } else {
            build_firewall_items_forward(flow, entry.proto, &entry.ports, comment)
        };
        tracing::debug!(
            "Service {}: {} rule(s) across {} server(s)",
            entry.service_name,
            count_rules(&rules),
            rules.len()
        );

        for (server, items) in rules {
            merged.entry(server).or_default().extend(items);
        }
    }

    merged
}

/// Total number of rules over all servers
pub fn count_rules(rules: &FirewallMap) -> usize {
    rules.values().map(Vec::len).sum()
}
