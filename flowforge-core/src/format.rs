//! Text and CSV rendering of generated artifacts

use crate::endpoint::EndpointKind;
use crate::firewall::FirewallMap;
use crate::routes::RouteMap;
use crate::topology::FirewallRuleRecord;

pub const CSV_HEADER: &str = "type,scope,env,srcType,src,dstType,dst,server,command";

/// Route commands grouped by server
pub fn format_routes(routes: &RouteMap, env_tag: &str) -> String {
    let mut lines = vec![
        format!("# Routing — including return route (Env: {})", env_tag),
        String::new(),
    ];
    for (server, items) in routes {
        lines.push(format!("## {}", server));
        lines.extend(items.iter().map(|item| item.command.clone()));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// nftables rule for a persisted or generated firewall record
pub fn format_rule(rule: &FirewallRuleRecord) -> String {
    let mut line = format!(
        "add rule inet filter {} ip saddr {} ip daddr {}",
        rule.dir.chain(),
        rule.src,
        rule.dst
    );
    if !rule.ports.is_empty() && rule.proto.has_ports() {
        line.push_str(&format!(" {} dport {{ {} }}", rule.proto, rule.ports));
    }
    line.push_str(" accept");

    let comment = rule.comment.replace('"', "");
    if !comment.is_empty() {
        line.push_str(&format!(" comment \"{}\"", comment));
    }
    line
}

/// Firewall rules grouped by server
pub fn format_firewall_rules(firewall: &FirewallMap, env_tag: &str, bidirectional: bool) -> String {
    let mode = if bidirectional { "bidirektional" } else { "einseitig" };
    let mut lines = vec![
        format!("# Firewall — {} (Env: {})", mode, env_tag),
        String::new(),
    ];
    for (server, rules) in firewall {
        lines.push(format!("## {}", server));
        lines.extend(rules.iter().map(format_rule));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// One CSV row per route command; warning items are left out
pub fn build_csv(
    routes: &RouteMap,
    env_tag: &str,
    src_kind: EndpointKind,
    src_name: &str,
    dst_kind: EndpointKind,
    dst_name: &str,
) -> String {
    let mut lines = vec![CSV_HEADER.to_string()];
    for (server, items) in routes {
        for item in items.iter().filter(|i| !i.warning) {
            lines.push(format!(
                "route,per-server,{},{},{},{},{},{},\"{}\"",
                env_tag,
                src_kind,
                src_name,
                dst_kind,
                dst_name,
                server,
                item.command.replace('"', "\"\"")
            ));
        }
    }
    lines.join("\n")
}
