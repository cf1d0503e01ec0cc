//! IPv4 address helpers shared by the grammars and the normalizer.

use std::net::Ipv4Addr;

pub fn prefix_to_mask(prefix: u8) -> Option<String> {
    if prefix > 32 {
        return None;
    }
    let bits = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    };
    Some(Ipv4Addr::from(bits).to_string())
}

/// Prefix length of a dotted mask; `None` for non-contiguous masks.
pub fn mask_to_prefix(mask: &str) -> Option<u8> {
    let bits = u32::from(mask.parse::<Ipv4Addr>().ok()?);
    let prefix = bits.leading_ones();
    if bits.checked_shl(prefix).unwrap_or(0) != 0 {
        return None;
    }
    Some(prefix as u8)
}

/// Splits `a.b.c.d/len` into an address and a dotted mask.
pub fn split_cidr(cidr: &str) -> Option<(String, String)> {
    let (address, prefix) = cidr.split_once('/')?;
    address.parse::<Ipv4Addr>().ok()?;
    let mask = prefix_to_mask(prefix.parse().ok()?)?;
    Some((address.to_string(), mask))
}

/// `10.0.0.0` + `255.0.0.0` becomes `10.0.0.0/8`.
pub fn to_cidr(address: &str, mask: &str) -> Option<String> {
    address.parse::<Ipv4Addr>().ok()?;
    let prefix = mask_to_prefix(mask)?;
    Some(format!("{}/{}", address, prefix))
}

/// Network an interface address belongs to, in CIDR notation.
pub fn network_range(address: &str, mask: &str) -> Option<String> {
    let ip = u32::from(address.parse::<Ipv4Addr>().ok()?);
    let prefix = mask_to_prefix(mask)?;
    let mask_bits = u32::from(mask.parse::<Ipv4Addr>().ok()?);
    Some(format!("{}/{}", Ipv4Addr::from(ip & mask_bits), prefix))
}
