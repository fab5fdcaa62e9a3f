//! Internal default topology embedded in the library
//!
//! Used when no topology file is configured or found. It is parsed once on
//! first access and cached using LazyLock.

use super::legacy::parse_topology;
use super::schema::Topology;
use std::sync::LazyLock;

static BUILTIN_TOPOLOGY: LazyLock<Topology> = LazyLock::new(load_builtin_topology);

/// Get the builtin topology
pub fn get_builtin() -> &'static Topology {
    &BUILTIN_TOPOLOGY
}

fn load_builtin_topology() -> Topology {
    const BUILTIN_JSON: &str = include_str!("../../assets/default-topology.json");
    parse_topology(BUILTIN_JSON).expect("Failed to parse builtin topology")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let topology = get_builtin();
        assert_eq!(topology.meta.app, "FlowForge LE");
        assert!(topology.servers.is_empty());
        assert!(topology.debian.disable_predictable);
    }

    #[test]
    fn test_builtin_cached() {
        let first = get_builtin();
        let second = get_builtin();
        assert_eq!(first as *const _, second as *const _);
    }
}
