//! Artifact generation pipeline
//!
//! Validates a [`GenerateRequest`], resolves both endpoints and derives the
//! route and firewall artifacts together with their text renderings.

use crate::endpoint::{resolve_endpoint, Endpoint, EndpointRef};
use crate::error::{ForgeError, Result, ValidationError};
use crate::firewall::{build_firewall_for_services, FirewallMap, ServiceEntry};
use crate::flow::Flow;
use crate::format::{build_csv, format_firewall_rules, format_routes};
use crate::routes::{build_routes_with_reverse, effective_metric, RouteMap};
use crate::topology::Topology;

/// One generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub env: String,
    pub src: EndpointRef,
    pub dst: EndpointRef,
    pub via_vlan: String,
    /// 0 or `None` selects the default metric
    pub metric: Option<u32>,
    pub bidirectional: bool,
    pub services: Vec<ServiceEntry>,
}

impl GenerateRequest {
    /// Check the request preconditions against a topology
    ///
    /// A via-VLAN that exists but is not eligible for the environment is
    /// accepted with a warning.
    pub fn validate(&self, topology: &Topology) -> std::result::Result<(), ValidationError> {
        if self.env.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "environment" });
        }
        if self.src.name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "source" });
        }
        if self.dst.name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "destination" });
        }
        if self.via_vlan.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "via VLAN" });
        }
        if topology.vlan(&self.via_vlan).is_none() {
            return Err(ValidationError::UnknownVlan {
                vlan: self.via_vlan.clone(),
            });
        }
        if self.services.is_empty() {
            return Err(ValidationError::MissingField { field: "services" });
        }

        if topology.env(&self.env).is_none() {
            tracing::debug!("Environment {} is not defined in the topology", self.env);
        }
        if !topology
            .via_vlan_candidates(&self.env)
            .iter()
            .any(|v| v == &self.via_vlan)
        {
            tracing::warn!(
                "VLAN {} is not an eligible via-VLAN for {}",
                self.via_vlan,
                self.env
            );
        }
        Ok(())
    }
}

/// Everything one generation run produces
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub routes: RouteMap,
    pub firewall: FirewallMap,
    pub routes_text: String,
    pub firewall_text: String,
    pub csv: String,
}

fn resolve<'a>(
    topology: &'a Topology,
    side: &'static str,
    endpoint: &EndpointRef,
    env_tag: &str,
) -> Result<Endpoint<'a>> {
    resolve_endpoint(topology, endpoint.kind, &endpoint.name, env_tag).ok_or_else(|| {
        ForgeError::EndpointNotResolved {
            side,
            kind: endpoint.kind.to_string(),
            name: endpoint.name.clone(),
        }
    })
}

/// Validate the request and derive routes, rules and their renderings
pub fn generate(topology: &Topology, request: &GenerateRequest) -> Result<Artifacts> {
    request.validate(topology)?;

    let flow = Flow {
        topology,
        src: resolve(topology, "Source", &request.src, &request.env)?,
        dst: resolve(topology, "Destination", &request.dst, &request.env)?,
        env_tag: &request.env,
        via_vlan: &request.via_vlan,
    };

    let metric = effective_metric(request.metric);
    let routes = build_routes_with_reverse(&flow, metric, "");
    let firewall = build_firewall_for_services(&flow, &request.services, request.bidirectional);

    let artifacts = Artifacts {
        routes_text: format_routes(&routes, &request.env),
        firewall_text: format_firewall_rules(&firewall, &request.env, request.bidirectional),
        csv: build_csv(
            &routes,
            &request.env,
            request.src.kind,
            &request.src.name,
            request.dst.kind,
            &request.dst.name,
        ),
        routes,
        firewall,
    };
    tracing::debug!(
        "Generated {} -> {} in {}: {} server(s) with routes, {} with rules",
        request.src,
        request.dst,
        request.env,
        artifacts.routes.len(),
        artifacts.firewall.len()
    );
    Ok(artifacts)
}
