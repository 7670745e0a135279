//! Prefix-length inference for bare addresses.

use std::net::Ipv4Addr;

use tracing::debug;
use vrouter_types::{netmask_prefix_len, Env};

use crate::vars;

/// Appends an inferred prefix length to a bare address.
///
/// Declared hints win over heuristics, in priority order:
///
/// 1. an explicit `/prefixlen` suffix is kept as-is;
/// 2. a declared `ETH<N>_MASK` yields its one-bit count;
/// 3. a declared `ETH<N>_NETWORK` yields 32 minus 8 per trailing zero
///    octet (one trailing zero octet implies a /24);
/// 4. private-range classification: `10.0.0.0/8` → 8,
///    `172.16.0.0/16` → 16, `192.168.0.0/24` → 24;
/// 5. otherwise /24.
///
/// A computed length of 0 is treated as a host route (/32). Inference
/// never fails; unusable hints are skipped.
pub fn infer_pfxlen(env: &Env, index: u32, value: &str) -> String {
    if value.contains('/') {
        return value.to_string();
    }

    let pfxlen = mask_hint(env, index)
        .or_else(|| network_hint(env, index))
        .unwrap_or_else(|| heuristic_pfxlen(value));

    let pfxlen = if pfxlen == 0 { 32 } else { pfxlen };

    format!("{}/{}", value, pfxlen)
}

fn mask_hint(env: &Env, index: u32) -> Option<u8> {
    let mask = env.get(&vars::mask_var(index)).filter(|v| !v.is_empty())?;

    match netmask_prefix_len(mask) {
        Ok(pfxlen) => Some(pfxlen),
        Err(err) => {
            debug!("ignoring ETH{}_MASK: {}", index, err);
            None
        }
    }
}

fn network_hint(env: &Env, index: u32) -> Option<u8> {
    let network = env
        .get(&vars::network_var(index))
        .filter(|v| !v.is_empty())?;

    let addr: Ipv4Addr = match network.parse() {
        Ok(addr) => addr,
        Err(_) => {
            debug!("ignoring ETH{}_NETWORK: not an IPv4 address", index);
            return None;
        }
    };

    let trailing_zero_octets = addr
        .octets()
        .iter()
        .rev()
        .take_while(|&&octet| octet == 0)
        .count() as u8;

    Some(32 - 8 * trailing_zero_octets)
}

fn heuristic_pfxlen(value: &str) -> u8 {
    let addr: Ipv4Addr = match value.parse() {
        Ok(addr) => addr,
        Err(_) => return 24,
    };

    let octets = addr.octets();
    if octets[0] == 10 {
        8
    } else if octets[0] == 172 && octets[1] == 16 {
        16
    } else {
        // 192.168.0.0/24 and everything else fall to /24.
        24
    }
}
