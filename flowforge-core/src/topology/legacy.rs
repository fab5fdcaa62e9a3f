//! Normalization of saved topologies into the canonical schema
//!
//! Older files carry several shapes that are still accepted:
//! - environments and services as plain strings
//! - `gateways: {ENV: {default, fallback}}` on VLANs instead of `scopes`
//! - `envs: [..]` on firewalls instead of `scopes`
//! - `proto` + `ports` on services instead of `portItems`
//! - alternate field names (`interface`, `networks`, `fwRules`, ...)
//!
//! Every shape is resolved once here; the rest of the crate only sees
//! [`Topology`].

use super::schema::{
    default_app, default_tagline, default_udev_path, default_version, DebianSettings,
    Direction, Environment, Firewall, FirewallRuleRecord, FirewallScope, Meta, PortItem,
    Roles, RouteRecord, Server, Service, Topology, Vlan, VlanScope, Zone, DEFAULT_METRIC,
};
use crate::protocol::Protocol;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Zone assigned to scopes migrated from pre-zone files
pub const LEGACY_ZONE_TAG: &str = "CORE";

/// Token of the former product name found in old udev paths
const LEGACY_UDEV_TOKEN: &str = "x4infra";

/// Accept only JSON arrays, skipping `null` and malformed elements
///
/// Returns `None` when the field is present but not an array so callers can
/// fall back to a legacy field, the same as when it is absent.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    let parsed = items
        .into_iter()
        .filter(|item| !item.is_null())
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Skipping malformed topology entry: {}", e);
                None
            }
        })
        .collect();
    Ok(Some(parsed))
}

/// String or number field
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn text(value: Option<Scalar>) -> String {
    value.map(Scalar::into_text).unwrap_or_default()
}

fn non_empty(value: Option<Scalar>) -> Option<String> {
    value.map(Scalar::into_text).filter(|s| !s.is_empty())
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Root of a saved topology in any supported shape
#[derive(Debug, Default, Deserialize)]
pub struct RawTopology {
    #[serde(default)]
    meta: Option<RawMeta>,
    #[serde(default)]
    debian: Option<RawDebian>,
    #[serde(default, deserialize_with = "lenient_list")]
    envs: Option<Vec<RawEnvironment>>,
    #[serde(default, deserialize_with = "lenient_list")]
    zones: Option<Vec<RawZone>>,
    #[serde(default, deserialize_with = "lenient_list")]
    vlans: Option<Vec<RawVlan>>,
    #[serde(default, deserialize_with = "lenient_list")]
    firewalls: Option<Vec<RawFirewall>>,
    #[serde(default, deserialize_with = "lenient_list")]
    services: Option<Vec<RawService>>,
    #[serde(default, deserialize_with = "lenient_list")]
    servers: Option<Vec<RawServer>>,
    #[serde(default)]
    provisioning: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    app: Option<String>,
    version: Option<String>,
    tagline: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDebian {
    udev_path: Option<String>,
    disable_predictable: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEnvironment {
    Tag(Scalar),
    Record {
        name: Option<Scalar>,
        tag: Option<Scalar>,
        comment: Option<Scalar>,
        domain: Option<Scalar>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawZone {
    name: Option<Scalar>,
    tag: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient_list")]
    env_tags: Option<Vec<String>>,
    /// Pre-rename field for `envTags`
    #[serde(default, deserialize_with = "lenient_list")]
    envs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVlan {
    name: Option<Scalar>,
    vlan_id: Option<Scalar>,
    id: Option<Scalar>,
    cidr: Option<Scalar>,
    iface: Option<Scalar>,
    interface: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient_list")]
    scopes: Option<Vec<RawVlanScope>>,
    /// Pre-zone gateways keyed by environment tag
    #[serde(default)]
    gateways: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVlanScope {
    env_tag: Option<Scalar>,
    zone_tag: Option<Scalar>,
    gw_default: Option<Scalar>,
    gw_fallback: Option<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGateway {
    default: Option<Scalar>,
    fallback: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFirewall {
    name: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient_list")]
    scopes: Option<Vec<RawFirewallScope>>,
    /// Pre-zone list of covered environment tags
    #[serde(default, deserialize_with = "lenient_list")]
    envs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFirewallScope {
    env_tag: Option<Scalar>,
    zone_tag: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawService {
    Name(Scalar),
    Record(RawServiceRecord),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServiceRecord {
    name: Option<Scalar>,
    comment: Option<Scalar>,
    description: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient_list")]
    port_items: Option<Vec<RawPortItem>>,
    proto: Option<String>,
    ports: Option<PortValue>,
    port: Option<PortValue>,
}

#[derive(Debug, Deserialize)]
struct RawPortItem {
    proto: Option<String>,
    value: Option<PortValue>,
    ports: Option<PortValue>,
}

/// Port value encodings seen in saved files
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Single(Scalar),
    List(Vec<Scalar>),
    Range(PortRange),
}

#[derive(Debug, Deserialize)]
struct PortRange {
    from: Option<Scalar>,
    start: Option<Scalar>,
    min: Option<Scalar>,
    to: Option<Scalar>,
    end: Option<Scalar>,
    max: Option<Scalar>,
}

impl PortValue {
    fn into_text(self) -> String {
        match self {
            PortValue::Single(s) => s.into_text().trim().to_string(),
            PortValue::List(items) => items
                .into_iter()
                .map(|s| s.into_text().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(","),
            PortValue::Range(r) => {
                let lo = r.from.or(r.start).or(r.min);
                let hi = r.to.or(r.end).or(r.max);
                match (lo, hi) {
                    (Some(lo), Some(hi)) => {
                        format!("{}-{}", lo.into_text().trim(), hi.into_text().trim())
                    }
                    _ => String::new(),
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServer {
    name: Option<Scalar>,
    octet: Option<Scalar>,
    os: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient_list")]
    envs: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    environments: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    vlans: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    networks: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    services: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    routes: Option<Vec<RawRoute>>,
    #[serde(default, deserialize_with = "lenient_list")]
    firewall_rules: Option<Vec<RawFirewallRule>>,
    #[serde(default, deserialize_with = "lenient_list")]
    fw_rules: Option<Vec<RawFirewallRule>>,
    #[serde(default)]
    roles: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoute {
    dst: Option<String>,
    via_vlan: Option<String>,
    gateway: Option<String>,
    dev: Option<String>,
    metric: Option<Scalar>,
    env_tag: Option<String>,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFirewallRule {
    dir: Option<String>,
    src: Option<String>,
    dst: Option<String>,
    proto: Option<String>,
    ports: Option<Scalar>,
    env_tag: Option<String>,
    comment: Option<String>,
}

/// Parse and normalize a topology document
pub fn parse_topology(json: &str) -> serde_json::Result<Topology> {
    let raw: RawTopology = serde_json::from_str(json)?;
    Ok(normalize(raw))
}

/// Resolve all legacy shapes into the canonical schema
pub fn normalize(raw: RawTopology) -> Topology {
    Topology {
        meta: normalize_meta(raw.meta),
        debian: normalize_debian(raw.debian),
        envs: raw
            .envs
            .unwrap_or_default()
            .into_iter()
            .map(normalize_environment)
            .collect(),
        zones: raw
            .zones
            .unwrap_or_default()
            .into_iter()
            .map(normalize_zone)
            .collect(),
        vlans: raw
            .vlans
            .unwrap_or_default()
            .into_iter()
            .map(normalize_vlan)
            .collect(),
        firewalls: raw
            .firewalls
            .unwrap_or_default()
            .into_iter()
            .map(normalize_firewall)
            .collect(),
        services: raw
            .services
            .unwrap_or_default()
            .into_iter()
            .map(normalize_service)
            .collect(),
        servers: raw
            .servers
            .unwrap_or_default()
            .into_iter()
            .map(normalize_server)
            .collect(),
        provisioning: match raw.provisioning {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        },
    }
}

fn normalize_meta(meta: Option<RawMeta>) -> Meta {
    let meta = meta.unwrap_or_default();
    Meta {
        app: meta.app.filter(|s| !s.is_empty()).unwrap_or_else(default_app),
        version: meta.version.filter(|s| !s.is_empty()).unwrap_or_else(default_version),
        tagline: meta.tagline.filter(|s| !s.is_empty()).unwrap_or_else(default_tagline),
    }
}

fn normalize_debian(debian: Option<RawDebian>) -> DebianSettings {
    let Some(debian) = debian else {
        return DebianSettings::default();
    };

    let udev_path = match debian.udev_path {
        Some(path) if path.contains(LEGACY_UDEV_TOKEN) => {
            path.replacen(LEGACY_UDEV_TOKEN, "flowforge", 1)
        }
        Some(path) if !path.is_empty() => path,
        _ => default_udev_path(),
    };

    DebianSettings {
        udev_path,
        disable_predictable: debian.disable_predictable.unwrap_or(true),
    }
}

fn normalize_environment(env: RawEnvironment) -> Environment {
    match env {
        RawEnvironment::Tag(tag) => {
            let tag = tag.into_text();
            Environment {
                name: tag.clone(),
                tag,
                domain: String::new(),
                comment: String::new(),
            }
        }
        RawEnvironment::Record {
            name,
            tag,
            comment,
            domain,
        } => Environment {
            name: text(name),
            tag: text(tag),
            domain: text(domain),
            comment: text(comment),
        },
    }
}

fn normalize_zone(zone: RawZone) -> Zone {
    Zone {
        name: text(zone.name),
        tag: text(zone.tag),
        env_tags: zone.env_tags.or(zone.envs).unwrap_or_default(),
    }
}

fn normalize_vlan(vlan: RawVlan) -> Vlan {
    let name = text(vlan.name);
    let scopes = match vlan.scopes {
        Some(scopes) => scopes
            .into_iter()
            .map(|s| VlanScope {
                env_tag: text(s.env_tag),
                zone_tag: text(s.zone_tag),
                gw_default: text(s.gw_default),
                gw_fallback: text(s.gw_fallback),
            })
            .collect(),
        None => match vlan.gateways {
            Some(Value::Object(gateways)) => migrate_gateways(&name, gateways),
            _ => vec![],
        },
    };

    Vlan {
        vlan_id: text(vlan.vlan_id.or(vlan.id)),
        cidr: text(vlan.cidr),
        iface: non_empty(vlan.iface)
            .or_else(|| non_empty(vlan.interface))
            .unwrap_or_default(),
        scopes,
        name,
    }
}

/// One scope per environment key, in file order
///
/// A gateway value that is not an object still yields a scope, without
/// gateway addresses.
fn migrate_gateways(vlan_name: &str, gateways: Map<String, Value>) -> Vec<VlanScope> {
    gateways
        .into_iter()
        .map(|(env_tag, gw)| {
            let gw = match gw {
                Value::Null => RawGateway::default(),
                Value::Object(_) => serde_json::from_value(gw).unwrap_or_else(|e| {
                    tracing::warn!("VLAN {} gateway for {} is malformed: {}", vlan_name, env_tag, e);
                    RawGateway::default()
                }),
                other => {
                    tracing::warn!(
                        "VLAN {} gateway for {} is not an object ({}), migrating without addresses",
                        vlan_name,
                        env_tag,
                        other
                    );
                    RawGateway::default()
                }
            };
            VlanScope {
                env_tag,
                zone_tag: LEGACY_ZONE_TAG.to_string(),
                gw_default: text(gw.default),
                gw_fallback: text(gw.fallback),
            }
        })
        .collect()
}

fn normalize_firewall(fw: RawFirewall) -> Firewall {
    let scopes = match fw.scopes {
        Some(scopes) => scopes
            .into_iter()
            .map(|s| FirewallScope {
                env_tag: text(s.env_tag),
                zone_tag: text(s.zone_tag),
            })
            .collect(),
        None => fw
            .envs
            .unwrap_or_default()
            .into_iter()
            .map(|env_tag| FirewallScope {
                env_tag,
                zone_tag: LEGACY_ZONE_TAG.to_string(),
            })
            .collect(),
    };

    Firewall {
        name: text(fw.name),
        scopes,
    }
}

fn normalize_service(service: RawService) -> Service {
    let record = match service {
        RawService::Name(name) => {
            return Service {
                name: name.into_text(),
                comment: String::new(),
                port_items: vec![],
            }
        }
        RawService::Record(record) => record,
    };

    let mut items: Vec<(Option<String>, String)> = record
        .port_items
        .unwrap_or_default()
        .into_iter()
        .map(|pi| {
            let value = pi.value.or(pi.ports).map(PortValue::into_text);
            (pi.proto, value.unwrap_or_default())
        })
        .collect();

    if items.is_empty() {
        let legacy_ports = record
            .ports
            .map(PortValue::into_text)
            .filter(|s| !s.is_empty())
            .or_else(|| record.port.map(PortValue::into_text));
        if let Some(ports) = legacy_ports {
            items.push((record.proto, ports));
        }
    }

    let port_items = items
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(proto, value)| {
            let proto = match proto.as_deref().map(str::trim) {
                None | Some("") => Protocol::Tcp,
                Some(p) => match p.parse() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!("Dropping port item {} of a service: {}", value, e);
                        return None;
                    }
                },
            };
            Some(PortItem { proto, value })
        })
        .collect();

    Service {
        name: text(record.name),
        comment: non_empty(record.comment)
            .or_else(|| non_empty(record.description))
            .unwrap_or_default(),
        port_items,
    }
}

fn normalize_server(server: RawServer) -> Server {
    let roles = match server.roles {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let firewall_rules = server
        .firewall_rules
        .or(server.fw_rules)
        .unwrap_or_default()
        .into_iter()
        .filter_map(normalize_firewall_rule)
        .collect();

    Server {
        name: text(server.name),
        os: non_empty(server.os)
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| "debian".to_string()),
        octet: text(server.octet),
        envs: server.envs.or(server.environments).unwrap_or_default(),
        vlans: server.vlans.or(server.networks).unwrap_or_default(),
        services: server.services.unwrap_or_default(),
        routes: server
            .routes
            .unwrap_or_default()
            .into_iter()
            .map(normalize_route)
            .collect(),
        firewall_rules,
        roles: Roles {
            dns: truthy(roles.get("dns")),
            ntp: truthy(roles.get("ntp")),
        },
    }
}

fn normalize_route(route: RawRoute) -> RouteRecord {
    let metric = route
        .metric
        .and_then(|m| m.into_text().trim().parse().ok())
        .unwrap_or(DEFAULT_METRIC);

    RouteRecord {
        dst: route.dst.unwrap_or_default(),
        via_vlan: route.via_vlan.unwrap_or_default(),
        gateway: route.gateway.unwrap_or_default(),
        dev: route.dev.unwrap_or_default(),
        metric,
        env_tag: route.env_tag.unwrap_or_default(),
        comment: route.comment.unwrap_or_default(),
    }
}

fn normalize_firewall_rule(rule: RawFirewallRule) -> Option<FirewallRuleRecord> {
    let proto = match rule.proto.as_deref().map(str::trim) {
        None | Some("") => Protocol::Tcp,
        Some(p) => match p.parse() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Dropping persisted firewall rule: {}", e);
                return None;
            }
        },
    };
    let dir = match rule.dir.as_deref().map(str::trim) {
        Some(d) if d.eq_ignore_ascii_case("in") => Direction::In,
        _ => Direction::Out,
    };

    Some(FirewallRuleRecord {
        dir,
        src: rule.src.unwrap_or_default(),
        dst: rule.dst.unwrap_or_default(),
        proto,
        ports: text(rule.ports),
        env_tag: rule.env_tag.unwrap_or_default(),
        comment: rule.comment.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let topology = parse_topology("{}").unwrap();
        assert!(topology.envs.is_empty());
        assert!(topology.servers.is_empty());
        assert_eq!(topology.meta.app, "FlowForge LE");
        assert_eq!(topology.debian.udev_path, "/etc/udev/rules.d/10-flowforge-ifnames.rules");
        assert!(topology.debian.disable_predictable);
    }

    #[test]
    fn test_string_environments_and_services() {
        let topology = parse_topology(
            r#"{"envs": ["PRD", null, {"tag": "DEV", "name": "Development"}],
                "services": ["ssh"]}"#,
        )
        .unwrap();

        assert_eq!(topology.envs.len(), 2);
        assert_eq!(topology.envs[0].name, "PRD");
        assert_eq!(topology.envs[0].tag, "PRD");
        assert_eq!(topology.envs[1].name, "Development");
        assert_eq!(topology.envs[1].domain, "");
        assert_eq!(topology.services[0].name, "ssh");
        assert!(topology.services[0].port_items.is_empty());
    }

    #[test]
    fn test_vlan_gateways_migrate_to_scopes() {
        let topology = parse_topology(
            r#"{"vlans": [{
                "name": "App-Net", "id": 20, "cidr": "10.1.1.0/24", "interface": "eth1",
                "gateways": {"PRD": {"default": "10.1.1.1", "fallback": "10.1.1.2"}, "DEV": null}
            }]}"#,
        )
        .unwrap();

        let vlan = &topology.vlans[0];
        assert_eq!(vlan.vlan_id, "20");
        assert_eq!(vlan.iface, "eth1");
        assert_eq!(vlan.scopes.len(), 2);
        assert_eq!(vlan.scopes[0].env_tag, "PRD");
        assert_eq!(vlan.scopes[0].zone_tag, "CORE");
        assert_eq!(vlan.scopes[0].gw_default, "10.1.1.1");
        assert_eq!(vlan.scopes[0].gw_fallback, "10.1.1.2");
        assert_eq!(vlan.scopes[1].env_tag, "DEV");
        assert_eq!(vlan.scopes[1].gw_default, "");
    }

    #[test]
    fn test_malformed_gateway_keeps_other_entries() {
        let topology = parse_topology(
            r#"{"vlans": [{
                "name": "App-Net", "cidr": "10.1.1.0/24",
                "gateways": {"PRD": {"default": "10.0.0.1"}, "DEV": "10.0.0.2", "TST": {"default": ["x"]}}
            }]}"#,
        )
        .unwrap();

        let scopes = &topology.vlans[0].scopes;
        assert_eq!(scopes.len(), 3);
        assert_eq!(scopes[0].env_tag, "PRD");
        assert_eq!(scopes[0].gw_default, "10.0.0.1");
        assert_eq!(scopes[1].env_tag, "DEV");
        assert_eq!(scopes[1].zone_tag, "CORE");
        assert_eq!(scopes[1].gw_default, "");
        assert_eq!(scopes[2].env_tag, "TST");
        assert_eq!(scopes[2].gw_default, "");
    }

    #[test]
    fn test_numeric_key_fields_are_coerced() {
        let topology = parse_topology(
            r#"{"envs": [1, {"name": 2, "tag": "DEV"}],
                "zones": [{"name": "Core", "tag": 7}],
                "vlans": [{"name": 20, "cidr": "10.1.1.0/24"}],
                "services": [53, {"name": 123, "comment": null}],
                "servers": [{"name": 42, "octet": 11}]}"#,
        )
        .unwrap();

        assert_eq!(topology.envs.len(), 2);
        assert_eq!(topology.envs[0].tag, "1");
        assert_eq!(topology.envs[1].name, "2");
        assert_eq!(topology.zones[0].tag, "7");
        assert_eq!(topology.vlans[0].name, "20");
        assert_eq!(topology.services[0].name, "53");
        assert_eq!(topology.services[1].name, "123");
        assert_eq!(topology.servers[0].name, "42");
        assert_eq!(topology.servers[0].os, "debian");
    }

    #[test]
    fn test_existing_scopes_win_over_gateways() {
        let topology = parse_topology(
            r#"{"vlans": [{
                "name": "App-Net", "cidr": "10.1.1.0/24",
                "scopes": [],
                "gateways": {"PRD": {"default": "10.1.1.1"}}
            }]}"#,
        )
        .unwrap();
        assert!(topology.vlans[0].scopes.is_empty());
    }

    #[test]
    fn test_firewall_envs_migrate_to_scopes() {
        let topology =
            parse_topology(r#"{"firewalls": [{"name": "fw1", "envs": ["PRD", "DEV"]}]}"#)
                .unwrap();
        let fw = &topology.firewalls[0];
        assert_eq!(fw.scopes.len(), 2);
        assert_eq!(fw.scopes[1].env_tag, "DEV");
        assert_eq!(fw.scopes[1].zone_tag, "CORE");
    }

    #[test]
    fn test_legacy_service_shapes() {
        let topology = parse_topology(
            r#"{"services": [
                {"name": "dns", "description": "Resolver", "proto": "tcpudp", "port": 53},
                {"name": "web", "portItems": [
                    {"proto": "tcp", "value": ["80", "443"]},
                    {"proto": "UDP", "ports": {"from": 20000, "to": 20100}},
                    {"proto": "TCP", "value": "  "}
                ]},
                {"name": "none", "proto": "TCP", "ports": ""}
            ]}"#,
        )
        .unwrap();

        let dns = &topology.services[0];
        assert_eq!(dns.comment, "Resolver");
        assert_eq!(dns.port_items.len(), 1);
        assert_eq!(dns.port_items[0].proto, Protocol::TcpUdp);
        assert_eq!(dns.port_items[0].value, "53");

        let web = &topology.services[1];
        assert_eq!(web.port_items.len(), 2);
        assert_eq!(web.port_items[0].value, "80,443");
        assert_eq!(web.port_items[1].proto, Protocol::Udp);
        assert_eq!(web.port_items[1].value, "20000-20100");

        assert!(topology.services[2].port_items.is_empty());
    }

    #[test]
    fn test_legacy_server_shapes() {
        let topology = parse_topology(
            r#"{"servers": [{
                "name": "app01", "octet": 11, "os": "OpenVMS",
                "environments": ["PRD"], "networks": ["App-Net"],
                "fwRules": [{"dir": "IN", "src": "10.0.0.0/24", "dst": "10.1.1.11/32",
                             "proto": "tcp", "ports": 22, "envTag": "PRD"}],
                "routes": [null, {"dst": "10.1.2.0/24", "metric": "50"}],
                "roles": {"dns": 1, "ntp": ""}
            }]}"#,
        )
        .unwrap();

        let srv = &topology.servers[0];
        assert_eq!(srv.octet, "11");
        assert_eq!(srv.octet_value(), Some(11));
        assert_eq!(srv.os, "openvms");
        assert_eq!(srv.envs, vec!["PRD"]);
        assert_eq!(srv.vlans, vec!["App-Net"]);
        assert_eq!(srv.firewall_rules.len(), 1);
        assert_eq!(srv.firewall_rules[0].dir, Direction::In);
        assert_eq!(srv.firewall_rules[0].ports, "22");
        assert_eq!(srv.routes.len(), 1);
        assert_eq!(srv.routes[0].metric, 50);
        assert!(srv.roles.dns);
        assert!(!srv.roles.ntp);
    }

    #[test]
    fn test_udev_path_legacy_token() {
        let topology = parse_topology(
            r#"{"debian": {"udevPath": "/etc/udev/rules.d/10-x4infra-ifnames.rules", "disablePredictable": false}}"#,
        )
        .unwrap();
        assert_eq!(topology.debian.udev_path, "/etc/udev/rules.d/10-flowforge-ifnames.rules");
        assert!(!topology.debian.disable_predictable);
    }

    #[test]
    fn test_non_array_collections_are_empty() {
        let topology = parse_topology(r#"{"vlans": {"oops": true}, "servers": null}"#).unwrap();
        assert!(topology.vlans.is_empty());
        assert!(topology.servers.is_empty());
    }

    #[test]
    fn test_canonical_round_trip() {
        let source = parse_topology(
            r#"{"envs": ["PRD"], "services": [{"name": "ssh", "portItems": [{"proto": "TCP", "value": "22"}]}]}"#,
        )
        .unwrap();
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains(r#""proto":"TCP""#));
        assert_eq!(parse_topology(&json).unwrap(), source);
    }
}
