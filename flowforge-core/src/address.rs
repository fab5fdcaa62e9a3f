//! IPv4 address derivation from VLAN CIDRs and host octets

use ipnet::Ipv4Net;

/// Lowest host octet a server may be assigned
pub const MIN_OCTET: u32 = 1;

/// Highest host octet a server may be assigned
pub const MAX_OCTET: u32 = 254;

fn parse_cidr(cidr: &str) -> Option<Ipv4Net> {
    cidr.trim().parse::<Ipv4Net>().ok()
}

/// Return the first three octets of a CIDR's address ("10.1.2.0/24" -> "10.1.2")
///
/// The address part is taken literally, not truncated to the network.
pub fn cidr_to_base(cidr: &str) -> Option<String> {
    let net = parse_cidr(cidr)?;
    let [a, b, c, _] = net.addr().octets();
    Some(format!("{}.{}.{}", a, b, c))
}

/// Dotted netmask for the CIDR's prefix length
pub fn cidr_to_netmask(cidr: &str) -> Option<String> {
    parse_cidr(cidr).map(|net| net.netmask().to_string())
}

/// Whether an octet is a usable host octet
pub fn is_valid_octet(octet: u32) -> bool {
    (MIN_OCTET..=MAX_OCTET).contains(&octet)
}

/// Combine a CIDR base with a host octet
pub fn derive_host_ip(cidr: &str, octet: u32) -> Option<String> {
    if !is_valid_octet(octet) {
        return None;
    }
    let base = cidr_to_base(cidr)?;
    Some(format!("{}.{}", base, octet))
}
