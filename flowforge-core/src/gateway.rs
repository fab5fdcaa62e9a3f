//! Gateway selection for a VLAN within an environment

use crate::topology::{Vlan, VlanScope};

/// Default and fallback next hop of a VLAN scope
///
/// Empty strings mean the scope carries no gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gateway {
    pub default: String,
    pub fallback: String,
}

impl From<&VlanScope> for Gateway {
    fn from(scope: &VlanScope) -> Self {
        Self {
            default: scope.gw_default.clone(),
            fallback: scope.gw_fallback.clone(),
        }
    }
}

/// Pick the gateway of a VLAN for an environment
///
/// Two steps, never an error:
/// 1. the first scope whose environment matches exactly
/// 2. otherwise the VLAN's first scope
///
/// A VLAN without scopes yields an empty gateway.
pub fn select_gateway(vlan: &Vlan, env_tag: &str) -> Gateway {
    let exact = vlan.scopes.iter().find(|s| s.env_tag == env_tag);
    let scope = match exact {
        Some(scope) => Some(scope),
        None => {
            if !vlan.scopes.is_empty() {
                tracing::debug!(
                    "VLAN {} has no scope for {}, using its first scope",
                    vlan.name,
                    env_tag
                );
            }
            vlan.scopes.first()
        }
    };

    scope.map(Gateway::from).unwrap_or_default()
}
