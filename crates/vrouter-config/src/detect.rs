//! Declaration scanning over the configuration snapshot.
//!
//! Each `detect_*` operation scans the full snapshot on every call; there
//! is no caching, so callers always see the snapshot they passed in.

use std::collections::BTreeMap;

use vrouter_types::{Env, Nic};

use crate::cidr::infer_pfxlen;
use crate::vars;

/// Per-NIC map of variable names to CIDR strings
/// (e.g. `eth0 -> { ETH0_IP0 -> 10.0.0.1/24 }`).
pub type AddrMap = BTreeMap<Nic, BTreeMap<String, String>>;

/// Extracts the primary address of every NIC.
///
/// `ETH<N>_IP` declarations (non-empty) become one `ETH<N>_IP0` entry per
/// NIC, with the prefix length inferred from declared hints.
pub fn detect_addrs(env: &Env) -> AddrMap {
    let mut addrs = AddrMap::new();

    for (name, value) in env.iter() {
        if value.is_empty() {
            continue;
        }
        if let Some(caps) = vars::ADDR_RE.captures(name) {
            if let Ok(index) = caps[1].parse::<u32>() {
                addrs
                    .entry(Nic::new(index))
                    .or_default()
                    .insert(format!("ETH{}_IP0", index), infer_pfxlen(env, index, value));
            }
        }
    }

    addrs
}

/// Extracts the virtual IPs of every NIC.
///
/// `ETH<N>_VROUTER_IP` seeds `ETH<N>_VIP0` only when no explicit VIP0 is
/// declared; `ONEAPP_VROUTER_ETH<N>_VIP<M>` always overwrites
/// `ETH<N>_VIP<M>`. The asymmetry is deliberate and order-independent.
pub fn detect_vips(env: &Env) -> AddrMap {
    let mut vips = AddrMap::new();

    for (name, value) in env.iter() {
        if value.is_empty() {
            continue;
        }

        if let Some(caps) = vars::VROUTER_IP_RE.captures(name) {
            if let Ok(index) = caps[1].parse::<u32>() {
                vips.entry(Nic::new(index))
                    .or_default()
                    .entry(format!("ETH{}_VIP0", index))
                    .or_insert_with(|| infer_pfxlen(env, index, value));
            }
        } else if let Some(caps) = vars::VIP_RE.captures(name) {
            if let (Ok(index), Ok(vip)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
                vips.entry(Nic::new(index)).or_default().insert(
                    format!("ETH{}_VIP{}", index, vip),
                    infer_pfxlen(env, index, value),
                );
            }
        }
    }

    vips
}

/// Derives per-NIC endpoint declarations from addresses and virtual IPs.
///
/// Keys are renamed (`_IP<i>` / `_VIP<i>` → `_EP<i>`) and shallow-merged
/// per NIC; VIP-derived entries win on collision.
pub fn detect_endpoints(addrs: &AddrMap, vips: &AddrMap) -> AddrMap {
    let mut endpoints = AddrMap::new();

    for (source, marker) in [(addrs, "_IP"), (vips, "_VIP")] {
        for (nic, declarations) in source {
            let renamed = endpoints.entry(*nic).or_default();
            for (name, value) in declarations {
                renamed.insert(name.replacen(marker, "_EP", 1), value.clone());
            }
        }
    }

    endpoints
}

/// Lists the NICs with a declared (non-empty) primary address, in
/// ascending numeric order.
pub fn detect_nics(env: &Env) -> Vec<Nic> {
    detect_addrs(env).into_keys().collect()
}

/// Lists the NICs marked as management-only interfaces.
pub fn detect_mgmt_nics(env: &Env) -> Vec<Nic> {
    let mut nics: Vec<Nic> = env
        .iter()
        .filter_map(|(name, _)| {
            let caps = vars::MGMT_RE.captures(name)?;
            let index = caps[1].parse::<u32>().ok()?;
            env.get_bool(name).then(|| Nic::new(index))
        })
        .collect();

    nics.sort();
    nics.dedup();
    nics
}

/// Maps each of the given NICs to its declared bare addresses.
pub fn nics_to_addrs(env: &Env, nics: &[Nic]) -> BTreeMap<Nic, Vec<String>> {
    let mut map = BTreeMap::new();

    for nic in nics {
        if let Some(addr) = env.get(&vars::addr_var(nic.index())).filter(|v| !v.is_empty()) {
            map.entry(*nic)
                .or_insert_with(Vec::new)
                .push(addr.to_string());
        }
    }

    map
}

/// Maps each declared bare address to the NICs carrying it (reverse of
/// [`nics_to_addrs`]).
pub fn addrs_to_nics(env: &Env, nics: &[Nic]) -> BTreeMap<String, Vec<Nic>> {
    let mut map: BTreeMap<String, Vec<Nic>> = BTreeMap::new();

    for (nic, addrs) in nics_to_addrs(env, nics) {
        for addr in addrs {
            let entry = map.entry(addr).or_default();
            if !entry.contains(&nic) {
                entry.push(nic);
            }
        }
    }

    map
}

/// Maps each declared virtual IP (CIDR suffix stripped, lower-cased) to
/// the NICs carrying it.
pub fn vips_to_nics(vips: &AddrMap) -> BTreeMap<String, Vec<Nic>> {
    let mut map: BTreeMap<String, Vec<Nic>> = BTreeMap::new();

    for (nic, declarations) in vips {
        for value in declarations.values() {
            let bare = value.split('/').next().unwrap_or(value).to_lowercase();
            let entry = map.entry(bare).or_default();
            if !entry.contains(nic) {
                entry.push(*nic);
            }
        }
    }

    map
}
