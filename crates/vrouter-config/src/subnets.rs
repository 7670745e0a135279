//! Subnet strings and usable address ranges.

use std::collections::BTreeMap;

use tracing::debug;
use vrouter_types::{Env, IpNet, Nic};

use crate::cidr::infer_pfxlen;
use crate::detect::AddrMap;
use crate::vars;

/// Derives the containing subnet of every declared primary address.
///
/// Keys are the declared `address/prefixlen` strings (prefix inferred per
/// the CIDR rules), values the containing `network/prefixlen`.
pub fn addrs_to_subnets(env: &Env, nics: &[Nic]) -> BTreeMap<String, String> {
    let mut subnets = BTreeMap::new();

    for nic in nics {
        let Some(addr) = env.get(&vars::addr_var(nic.index())).filter(|v| !v.is_empty()) else {
            continue;
        };
        insert_subnet(&mut subnets, &infer_pfxlen(env, nic.index(), addr));
    }

    subnets
}

/// Derives the containing subnet of every declared virtual IP, same
/// shape as [`addrs_to_subnets`].
pub fn vips_to_subnets(env: &Env, nics: &[Nic], vips: &AddrMap) -> BTreeMap<String, String> {
    let mut subnets = BTreeMap::new();

    for nic in nics {
        let Some(declarations) = vips.get(nic) else {
            continue;
        };
        for value in declarations.values() {
            insert_subnet(&mut subnets, &infer_pfxlen(env, nic.index(), value));
        }
    }

    subnets
}

fn insert_subnet(subnets: &mut BTreeMap<String, String>, cidr: &str) {
    match cidr.parse::<IpNet>() {
        Ok(net) => {
            subnets.insert(cidr.to_string(), net.network().to_string());
        }
        Err(err) => debug!("skipping undecodable address {}: {}", cidr, err),
    }
}

/// Computes the usable address range of each subnet.
///
/// The network address and the first usable address are reserved at the
/// start, the broadcast/all-ones address at the end, so a block yields
/// `first+2` through `last-1`. Blocks of four or fewer addresses are too
/// small to carve a range and emit nothing.
pub fn subnets_to_ranges<S: AsRef<str>>(subnets: &[S]) -> BTreeMap<String, String> {
    let mut ranges = BTreeMap::new();

    for subnet in subnets {
        let subnet = subnet.as_ref();
        let net = match subnet.parse::<IpNet>() {
            Ok(net) => net,
            Err(err) => {
                debug!("skipping undecodable subnet {}: {}", subnet, err);
                continue;
            }
        };

        let (first, last) = (net.first(), net.last());
        if last - first <= 3 {
            debug!("subnet {} is too small for a usable range", subnet);
            continue;
        }

        ranges.insert(
            subnet.to_string(),
            format!(
                "{}-{}",
                net.addr_from_bits(first + 2),
                net.addr_from_bits(last - 1)
            ),
        );
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_vips;
    use pretty_assertions::assert_eq;
    use vrouter_types::Env;

    fn nics(indices: &[u32]) -> Vec<Nic> {
        indices.iter().map(|i| Nic::new(*i)).collect()
    }

    fn strings(map: &[(&str, &str)]) -> BTreeMap<String, String> {
        map.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_addrs_to_subnets() {
        let env: Env = [
            ("ETH0_IP", "10.0.1.1"),
            ("ETH0_MASK", "255.255.255.255"),
            ("ETH1_IP", "172.16.1.1"),
            ("ETH1_MASK", "255.255.0.0"),
            ("ETH2_IP", "172.18.1.1"),
            ("ETH2_MASK", "255.255.255.0"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            addrs_to_subnets(&env, &nics(&[0])),
            strings(&[("10.0.1.1/32", "10.0.1.1/32")])
        );

        assert_eq!(
            addrs_to_subnets(&env, &nics(&[1, 2])),
            strings(&[
                ("172.16.1.1/16", "172.16.0.0/16"),
                ("172.18.1.1/24", "172.18.1.0/24"),
            ])
        );
    }

    #[test]
    fn test_vips_to_subnets() {
        let env: Env = [
            ("ETH0_MASK", "255.255.255.0"),
            ("ONEAPP_VROUTER_ETH0_VIP0", "1.2.3.4"),
            ("ONEAPP_VROUTER_ETH0_VIP1", "2.3.4.5/16"),
            ("ONEAPP_VROUTER_ETH1_VIP0", "10.7.8.9"),
        ]
        .into_iter()
        .collect();

        let vips = detect_vips(&env);

        assert_eq!(
            vips_to_subnets(&env, &nics(&[0, 1]), &vips),
            strings(&[
                ("1.2.3.4/24", "1.2.3.0/24"),
                ("2.3.4.5/16", "2.3.0.0/16"),
                ("10.7.8.9/8", "10.0.0.0/8"),
            ])
        );
    }

    #[test]
    fn test_subnets_to_ranges() {
        assert_eq!(
            subnets_to_ranges(&["172.16.0.0/16", "172.18.1.0/24"]),
            strings(&[
                ("172.16.0.0/16", "172.16.0.2-172.16.255.254"),
                ("172.18.1.0/24", "172.18.1.2-172.18.1.254"),
            ])
        );
    }

    #[test]
    fn test_subnets_to_ranges_ipv6() {
        assert_eq!(
            subnets_to_ranges(&["2001:db8:1:0::/64", "2001:db8:1:1::/64"]),
            strings(&[
                (
                    "2001:db8:1:0::/64",
                    "2001:db8:1::2-2001:db8:1:0:ffff:ffff:ffff:fffe"
                ),
                (
                    "2001:db8:1:1::/64",
                    "2001:db8:1:1::2-2001:db8:1:1:ffff:ffff:ffff:fffe"
                ),
            ])
        );
    }

    #[test]
    fn test_tiny_blocks_yield_no_range() {
        assert!(subnets_to_ranges(&["10.0.0.0/30"]).is_empty());
        assert!(subnets_to_ranges(&["10.0.0.1/32"]).is_empty());
        // /29 spans 8 addresses and is the smallest usable block.
        assert_eq!(
            subnets_to_ranges(&["10.0.0.0/29"]),
            strings(&[("10.0.0.0/29", "10.0.0.2-10.0.0.6")])
        );
    }
}
