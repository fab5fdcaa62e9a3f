//! Subcommand implementations
//!
//! Each command returns the text to print on stdout.

use anyhow::{bail, Context, Result};
use flowforge_core::{
    apply_artifacts, generate, Artifacts, GenerateRequest, ServiceEntry, Topology, TopologyLoader,
    TopologyValidator,
};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ROUTES_FILE: &str = "routes.txt";
pub const FIREWALL_FILE: &str = "firewall.txt";
pub const CSV_FILE: &str = "routes.csv";

/// A catalogue service picked on the command line as `NAME[:INDEX]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSelection {
    pub name: String,
    /// Port item index, clamped to the service's items
    pub index: usize,
}

impl FromStr for ServiceSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, index) = match s.rsplit_once(':') {
            Some((name, index)) => {
                let index = index
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid port item index in {:?}", s))?;
                (name, index)
            }
            None => (s, 0),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing service name in {:?}", s));
        }
        Ok(Self {
            name: name.to_string(),
            index,
        })
    }
}

impl ServiceSelection {
    pub fn resolve(&self, topology: &Topology) -> Result<ServiceEntry> {
        Ok(ServiceEntry::resolve(topology, &self.name, self.index)?)
    }
}

/// File the loaded topology came from, if any
/// Priority: explicit path > configured path that exists
pub fn topology_source(explicit: Option<&Path>, configured: Option<&Path>) -> Option<PathBuf> {
    explicit
        .or_else(|| configured.filter(|p| p.exists()))
        .map(Path::to_path_buf)
}

pub fn check(topology: &Topology) -> Result<String> {
    TopologyValidator::validate(topology).context("Topology is inconsistent")?;
    TopologyValidator::check_prerequisites(topology)?;
    Ok(format!(
        "Topology OK: {} environment(s), {} zone(s), {} VLAN(s), {} service(s), {} server(s)",
        topology.envs.len(),
        topology.zones.len(),
        topology.vlans.len(),
        topology.services.len(),
        topology.servers.len()
    ))
}

pub fn list(topology: &Topology, env_tag: &str) -> Result<String> {
    if topology.env(env_tag).is_none() {
        tracing::warn!("Environment {} is not defined in the topology", env_tag);
    }

    let mut out = String::new();
    let sections = [
        ("Servers", topology.servers_in_env(env_tag)),
        ("VLANs", topology.vlans_in_env(env_tag)),
        ("Via-VLAN candidates", topology.via_vlan_candidates(env_tag)),
    ];
    for (title, names) in sections {
        writeln!(out, "{} in {}:", title, env_tag)?;
        if names.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for name in names {
            writeln!(out, "  {}", name)?;
        }
    }
    Ok(out.trim_end().to_string())
}

/// Via-VLAN to use: the explicit one, or the only eligible candidate
pub fn pick_via_vlan(topology: &Topology, env_tag: &str, explicit: Option<&str>) -> Result<String> {
    if let Some(via) = explicit {
        return Ok(via.to_string());
    }

    let candidates = topology.via_vlan_candidates(env_tag);
    match candidates.as_slice() {
        [only] => {
            tracing::debug!("Using {} as the only via-VLAN candidate for {}", only, env_tag);
            Ok(only.clone())
        }
        [] => bail!("--via is required: no eligible VLAN in {}", env_tag),
        many => bail!(
            "--via is required: eligible VLANs in {} are {}",
            env_tag,
            many.join(", ")
        ),
    }
}

/// Write the three artifact files into a directory
pub fn write_artifacts(dir: &Path, artifacts: &Artifacts) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {:?}", dir))?;

    let files = [
        (ROUTES_FILE, &artifacts.routes_text),
        (FIREWALL_FILE, &artifacts.firewall_text),
        (CSV_FILE, &artifacts.csv),
    ];
    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = dir.join(name);
        fs::write(&path, contents).with_context(|| format!("Failed to write {:?}", path))?;
        written.push(path);
    }
    Ok(written)
}

/// Where `generate` sends its results
#[derive(Debug, Clone, Default)]
pub struct GenerateOutput {
    pub out_dir: Option<PathBuf>,
    /// Persist the artifacts into the topology file at this path
    pub apply_to: Option<PathBuf>,
}

pub fn run_generate(
    topology: &mut Topology,
    request: &GenerateRequest,
    output: &GenerateOutput,
) -> Result<String> {
    let artifacts = generate(topology, request)?;
    let mut out = String::new();

    match &output.out_dir {
        Some(dir) => {
            for path in write_artifacts(dir, &artifacts)? {
                writeln!(out, "Wrote {}", path.display())?;
            }
        }
        None => {
            writeln!(out, "{}", artifacts.routes_text)?;
            writeln!(out, "{}", artifacts.firewall_text)?;
        }
    }

    if let Some(path) = &output.apply_to {
        let report = apply_artifacts(topology, &artifacts.routes, &artifacts.firewall);
        for server in &report.skipped_servers {
            writeln!(out, "Skipped unknown server {}", server)?;
        }
        if !report.is_empty() {
            TopologyLoader::save_to_file(topology, path)?;
        }
        writeln!(out, "{}", report.message())?;
    }

    Ok(out.trim_end().to_string())
}

pub fn normalize(topology: &Topology, target: &Path) -> Result<String> {
    TopologyLoader::save_to_file(topology, target)?;
    Ok(format!("Wrote canonical topology to {}", target.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowforge_core::topology::{Firewall, FirewallScope, PortItem, Server, Service, Vlan, VlanScope};
    use flowforge_core::{EndpointRef, Protocol};
    use tempfile::TempDir;

    fn vlan(name: &str, cidr: &str, zone: &str) -> Vlan {
        Vlan {
            name: name.to_string(),
            cidr: cidr.to_string(),
            iface: "eth1".to_string(),
            scopes: vec![VlanScope {
                env_tag: "PRD".to_string(),
                zone_tag: zone.to_string(),
                gw_default: "10.0.0.1".to_string(),
                gw_fallback: String::new(),
            }],
            ..Default::default()
        }
    }

    fn create_test_topology() -> Topology {
        let server = |name: &str, octet: &str, vlan: &str| {
            let mut s = Server::new(name);
            s.octet = octet.to_string();
            s.envs = vec!["PRD".to_string()];
            s.vlans = vec![vlan.to_string()];
            s
        };
        Topology {
            vlans: vec![vlan("App-Net", "10.1.1.0/24", "APP"), vlan("Db-Net", "10.1.2.0/24", "DB")],
            firewalls: vec![Firewall {
                name: "fw-app".to_string(),
                scopes: vec![FirewallScope {
                    env_tag: "PRD".to_string(),
                    zone_tag: "APP".to_string(),
                }],
            }],
            services: vec![Service {
                name: "postgres".to_string(),
                comment: String::new(),
                port_items: vec![PortItem {
                    proto: Protocol::Tcp,
                    value: "5432".to_string(),
                }],
            }],
            servers: vec![server("app01", "11", "App-Net"), server("db01", "21", "Db-Net")],
            ..Default::default()
        }
    }

    fn create_request(topology: &Topology) -> GenerateRequest {
        let service = "postgres".parse::<ServiceSelection>().unwrap();
        GenerateRequest {
            env: "PRD".to_string(),
            src: EndpointRef::server("app01"),
            dst: EndpointRef::server("db01"),
            via_vlan: pick_via_vlan(topology, "PRD", None).unwrap(),
            metric: None,
            bidirectional: false,
            services: vec![service.resolve(topology).unwrap()],
        }
    }

    #[test]
    fn test_parse_service_selection() {
        assert_eq!(
            "dns:1".parse::<ServiceSelection>().unwrap(),
            ServiceSelection {
                name: "dns".to_string(),
                index: 1
            }
        );
        assert_eq!("ssh".parse::<ServiceSelection>().unwrap().index, 0);
        assert!("dns:x".parse::<ServiceSelection>().is_err());
        assert!(":1".parse::<ServiceSelection>().is_err());
    }

    #[test]
    fn test_pick_via_vlan() {
        let topology = create_test_topology();
        assert_eq!(pick_via_vlan(&topology, "PRD", None).unwrap(), "App-Net");
        assert_eq!(pick_via_vlan(&topology, "PRD", Some("Db-Net")).unwrap(), "Db-Net");
        assert!(pick_via_vlan(&topology, "DEV", None).is_err());
    }

    #[test]
    fn test_list_sections() {
        let topology = create_test_topology();
        let out = list(&topology, "PRD").unwrap();
        assert!(out.starts_with("Servers in PRD:\n  app01\n  db01\n"));
        assert!(out.contains("VLANs in PRD:\n  App-Net\n  Db-Net\n"));
        assert!(out.ends_with("Via-VLAN candidates in PRD:\n  App-Net"));
    }

    #[test]
    fn test_check_reports_missing_prerequisites() {
        let topology = create_test_topology();
        let err = check(&topology).unwrap_err();
        assert!(err.to_string().contains("environments"));
    }

    #[test]
    fn test_generate_writes_files() {
        let dir = TempDir::new().unwrap();
        let mut topology = create_test_topology();
        let request = create_request(&topology);
        let output = GenerateOutput {
            out_dir: Some(dir.path().join("out")),
            apply_to: None,
        };

        let out = run_generate(&mut topology, &request, &output).unwrap();
        assert_eq!(out.lines().count(), 3);

        let routes = fs::read_to_string(dir.path().join("out").join(ROUTES_FILE)).unwrap();
        assert!(routes.contains("## app01\nip route add 10.1.2.21/32 via 10.0.0.1 dev eth1 metric 100"));
        let csv = fs::read_to_string(dir.path().join("out").join(CSV_FILE)).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_generate_apply_saves_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("topology.json");
        let mut topology = create_test_topology();
        TopologyLoader::save_to_file(&topology, &path).unwrap();

        let request = create_request(&topology);
        let output = GenerateOutput {
            out_dir: None,
            apply_to: Some(path.clone()),
        };

        let first = run_generate(&mut topology, &request, &output).unwrap();
        assert!(first.ends_with("Saved: 2 route(s), 2 firewall rule(s)."));
        let saved = TopologyLoader::load_from_file(&path).unwrap();
        assert_eq!(saved.server("app01").unwrap().routes.len(), 1);

        let second = run_generate(&mut topology, &request, &output).unwrap();
        assert!(second.ends_with("No new entries - everything already exists."));
    }

    #[test]
    fn test_topology_source() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("net.json");
        fs::write(&existing, "{}").unwrap();
        let missing = dir.path().join("missing.json");

        assert_eq!(topology_source(Some(missing.as_path()), Some(existing.as_path())), Some(missing.clone()));
        assert_eq!(topology_source(None, Some(existing.as_path())), Some(existing));
        assert_eq!(topology_source(None, Some(missing.as_path())), None);
        assert_eq!(topology_source(None, None), None);
    }
}
