//! Merging generated artifacts into the topology store

use crate::firewall::FirewallMap;
use crate::routes::RouteMap;
use crate::topology::Topology;
use std::collections::BTreeSet;

/// Outcome of merging generated routes and rules into the topology
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub routes_added: usize,
    pub rules_added: usize,
    /// Servers named in the artifacts but missing from the topology
    pub skipped_servers: Vec<String>,
}

impl ApplyReport {
    pub fn is_empty(&self) -> bool {
        self.routes_added == 0 && self.rules_added == 0
    }

    pub fn message(&self) -> String {
        if self.is_empty() {
            "No new entries - everything already exists.".to_string()
        } else {
            format!(
                "Saved: {} route(s), {} firewall rule(s).",
                self.routes_added, self.rules_added
            )
        }
    }
}

/// Persist new routes and rules on their servers
///
/// An entry equal to one already on the server is skipped, including
/// entries added earlier in the same call. Warning route items are never
/// persisted.
pub fn apply_artifacts(topology: &mut Topology, routes: &RouteMap, firewall: &FirewallMap) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut skipped = BTreeSet::new();

    for (name, items) in routes {
        let Some(server) = topology.server_mut(name) else {
            skipped.insert(name.clone());
            continue;
        };
        for item in items.iter().filter(|i| !i.warning) {
            if server.routes.contains(&item.record) {
                continue;
            }
            server.routes.push(item.record.clone());
            report.routes_added += 1;
        }
    }

    for (name, rules) in firewall {
        let Some(server) = topology.server_mut(name) else {
            skipped.insert(name.clone());
            continue;
        };
        for rule in rules {
            if server.firewall_rules.contains(rule) {
                continue;
            }
            server.firewall_rules.push(rule.clone());
            report.rules_added += 1;
        }
    }

    for name in &skipped {
        tracing::warn!("Server {} is not in the topology, skipping", name);
    }
    report.skipped_servers = skipped.into_iter().collect();

    tracing::debug!(
        "Applied {} route(s), {} firewall rule(s)",
        report.routes_added,
        report.rules_added
    );
    report
}
