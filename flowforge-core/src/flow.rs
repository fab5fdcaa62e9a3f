//! A resolved flow between two endpoints

use crate::endpoint::{endpoint_addr, endpoint_specs, AddressSpec, Endpoint};
use crate::topology::Topology;

/// Everything the route and rule builders need to know about one flow
///
/// `via_vlan` is both the preferred outbound VLAN and the hint used when
/// deriving server addresses.
#[derive(Debug, Clone)]
pub struct Flow<'a> {
    pub topology: &'a Topology,
    pub src: Endpoint<'a>,
    pub dst: Endpoint<'a>,
    pub env_tag: &'a str,
    pub via_vlan: &'a str,
}

impl<'a> Flow<'a> {
    pub fn src_specs(&self) -> Vec<AddressSpec> {
        endpoint_specs(self.topology, &self.src, self.via_vlan)
    }

    pub fn dst_specs(&self) -> Vec<AddressSpec> {
        endpoint_specs(self.topology, &self.dst, self.via_vlan)
    }

    pub fn src_addr(&self) -> String {
        endpoint_addr(self.topology, &self.src, self.via_vlan)
    }

    pub fn dst_addr(&self) -> String {
        endpoint_addr(self.topology, &self.dst, self.via_vlan)
    }
}
