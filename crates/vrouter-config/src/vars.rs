//! The contextualization variable-name grammar.
//!
//! Every scanner in this crate classifies snapshot keys against this
//! fixed set of patterns and accumulates per-index builder records, so
//! precedence and override rules live in one place per scanner instead
//! of being re-derived ad hoc.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of statically declared load-balancer variables (LVS flavor).
pub const VNF_LB_PREFIX: &str = "ONEAPP_VNF_LB";

/// Prefix of statically declared load-balancer variables (HAProxy flavor).
pub const VNF_HAPROXY_LB_PREFIX: &str = "ONEAPP_HAPROXY_VNF_LB";

/// Prefix of dynamically reported load-balancer attributes (LVS flavor).
pub const GATE_LB_PREFIX: &str = "ONEGATE_LB";

/// Prefix of dynamically reported load-balancer attributes (HAProxy flavor).
pub const GATE_HAPROXY_LB_PREFIX: &str = "ONEGATE_HAPROXY_LB";

/// `ETH<N>_IP`: the primary address of a NIC.
pub static ADDR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ETH(\d+)_IP$").expect("Invalid regex pattern"));

/// `ETH<N>_VROUTER_IP`: legacy alias seeding `ETH<N>_VIP0`.
pub static VROUTER_IP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ETH(\d+)_VROUTER_IP$").expect("Invalid regex pattern"));

/// `ONEAPP_VROUTER_ETH<N>_VIP<M>`: explicit virtual-IP declaration.
pub static VIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ONEAPP_VROUTER_ETH(\d+)_VIP(\d+)$").expect("Invalid regex pattern"));

/// `ETH<N>_VROUTER_MANAGEMENT`: marks a NIC as management-only.
pub static MGMT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ETH(\d+)_VROUTER_MANAGEMENT$").expect("Invalid regex pattern"));

/// `<NAME>`: placeholder syntax accepted by backend resolution.
pub static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([A-Z0-9_]+)>$").expect("Invalid regex pattern"));

/// Name of the netmask variable for a NIC index.
pub fn mask_var(index: u32) -> String {
    format!("ETH{}_MASK", index)
}

/// Name of the network-address variable for a NIC index.
pub fn network_var(index: u32) -> String {
    format!("ETH{}_NETWORK", index)
}

/// Name of the primary-address variable for a NIC index.
pub fn addr_var(index: u32) -> String {
    format!("ETH{}_IP", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_anchor() {
        assert!(ADDR_RE.is_match("ETH0_IP"));
        assert!(!ADDR_RE.is_match("ETH0_IP0"));
        assert!(!ADDR_RE.is_match("XETH0_IP"));

        assert!(VIP_RE.is_match("ONEAPP_VROUTER_ETH2_VIP10"));
        assert!(!VIP_RE.is_match("ONEAPP_VROUTER_ETH2_VIP"));

        assert!(PLACEHOLDER_RE.is_match("<ETH0_VIP0>"));
        assert!(!PLACEHOLDER_RE.is_match("<eth0_vip0>"));
        assert!(!PLACEHOLDER_RE.is_match("ETH0_VIP0"));
    }

    #[test]
    fn test_var_names() {
        assert_eq!(mask_var(3), "ETH3_MASK");
        assert_eq!(network_var(0), "ETH0_NETWORK");
        assert_eq!(addr_var(1), "ETH1_IP");
    }
}
