//! Static route generation
//!
//! Routes are always built in both directions: every source server gets a
//! route to each destination address and every destination server gets the
//! return route.

use crate::endpoint::AddressSpec;
use crate::flow::Flow;
use crate::gateway::select_gateway;
use crate::topology::{RouteRecord, Server, Topology, DEFAULT_METRIC};
use std::collections::BTreeMap;

pub const GATEWAY_PLACEHOLDER: &str = "<gateway>";
pub const IFACE_PLACEHOLDER: &str = "<iface>";

/// Generated routes keyed by server name, in generation order per server
pub type RouteMap = BTreeMap<String, Vec<RouteItem>>;

/// One generated route for one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteItem {
    /// Shell command, or a `#` comment when `warning` is set
    pub command: String,
    /// The server had no VLAN to route through
    pub warning: bool,
    pub record: RouteRecord,
}

/// Metric to use for a requested value; 0 means "not given"
pub fn effective_metric(metric: Option<u32>) -> u32 {
    match metric {
        Some(0) | None => DEFAULT_METRIC,
        Some(m) => m,
    }
}

/// Build the route of one server towards one address
///
/// The outbound VLAN is `via_vlan` when the server is a member of it,
/// otherwise the server's first VLAN. Without any usable VLAN the item is a
/// warning comment.
pub fn build_route_item(
    topology: &Topology,
    server: &Server,
    spec: &AddressSpec,
    env_tag: &str,
    metric: u32,
    via_vlan: &str,
    comment: &str,
) -> RouteItem {
    let metric = effective_metric(Some(metric));
    let outbound = if !via_vlan.is_empty() && server.in_vlan(via_vlan) {
        Some(via_vlan)
    } else {
        server.vlans.first().map(String::as_str)
    };

    let Some(vlan) = outbound.and_then(|name| topology.vlan(name)) else {
        tracing::warn!("{} has no VLAN for routing", server.name);
        return RouteItem {
            command: format!("# WARN: {} has no VLAN for routing.", server.name),
            warning: true,
            record: RouteRecord {
                dst: String::new(),
                via_vlan: String::new(),
                gateway: String::new(),
                dev: String::new(),
                metric,
                env_tag: env_tag.to_string(),
                comment: comment.to_string(),
            },
        };
    };

    let gw = select_gateway(vlan, env_tag);
    let via = if gw.default.is_empty() {
        GATEWAY_PLACEHOLDER
    } else {
        gw.default.as_str()
    };
    let dev = if vlan.iface.is_empty() {
        IFACE_PLACEHOLDER
    } else {
        vlan.iface.as_str()
    };

    let mut command = format!(
        "ip route add {} via {} dev {} metric {}",
        spec.value, via, dev, metric
    );
    if !gw.fallback.is_empty() {
        command.push_str(&format!(" # fallback: {}", gw.fallback));
    }

    tracing::debug!("{}: {} via {}", server.name, spec.value, vlan.name);
    RouteItem {
        command,
        warning: false,
        record: RouteRecord {
            dst: spec.value.clone(),
            via_vlan: vlan.name.clone(),
            gateway: gw.default,
            dev: vlan.iface.clone(),
            metric,
            env_tag: env_tag.to_string(),
            comment: comment.to_string(),
        },
    }
}

/// Forward routes on the source servers plus return routes on the
/// destination servers
pub fn build_routes_with_reverse(flow: &Flow<'_>, metric: u32, comment: &str) -> RouteMap {
    let dst_specs = flow.dst_specs();
    let src_specs = flow.src_specs();
    let mut routes = RouteMap::new();

    let legs = [
        (flow.src.servers(), &dst_specs),
        (flow.dst.servers(), &src_specs),
    ];
    for (servers, specs) in legs {
        for server in servers {
            let items = routes.entry(server.name.clone()).or_default();
            for spec in specs.iter() {
                items.push(build_route_item(
                    flow.topology,
                    server,
                    spec,
                    flow.env_tag,
                    metric,
                    flow.via_vlan,
                    comment,
                ));
            }
        }
    }

    routes
}
