//! The interface-selection expression grammar.
//!
//! Services declare which NICs they listen on with a free-form expression
//! like `"eth0/10.0.0.1@53 !eth2"`. Tokens select interfaces by name, by
//! address, or both; `!` excludes. Malformed or unresolvable tokens are
//! ignored silently and contribute no descriptor.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use vrouter_types::{Env, Nic};

use crate::detect::{addrs_to_nics, detect_nics, detect_vips, vips_to_nics};

/// Leading NIC name of a selection token.
static NIC_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^eth\d+").expect("Invalid regex pattern"));

/// One interface descriptor produced by [`parse_interfaces`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IfacePart {
    /// The resolved NIC, absent only while a token is being decomposed.
    pub name: Option<Nic>,
    /// Listen address, if the token carried one.
    pub addr: Option<String>,
    /// Listen port, if the token carried one.
    pub port: Option<String>,
}

impl IfacePart {
    /// Creates a descriptor for a named NIC.
    pub fn named(nic: Nic) -> Self {
        IfacePart {
            name: Some(nic),
            ..Default::default()
        }
    }

    /// Sets the address.
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }
}

/// Parses an interface-selection expression into ordered per-NIC
/// descriptor sequences.
///
/// `None` selects nothing. An expression without inclusion tokens (e.g.
/// `""` or `"!eth2"`) selects every NIC with a declared address. Nameless
/// tokens are resolved through the reverse address table first, then the
/// reverse VIP table, emitting one descriptor per matching NIC; tokens
/// that resolve to nothing are dropped. Exclusions always win, no matter
/// how many inclusion tokens also named the NIC.
pub fn parse_interfaces(env: &Env, interfaces: Option<&str>) -> BTreeMap<Nic, Vec<IfacePart>> {
    let Some(expression) = interfaces else {
        return BTreeMap::new();
    };

    let mut included: Vec<String> = Vec::new();
    let mut excluded_tokens: Vec<String> = Vec::new();

    for raw in expression.split([' ', ',', ';']) {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        match token.strip_prefix('!') {
            Some(stripped) if !stripped.is_empty() => excluded_tokens.push(stripped.to_string()),
            Some(_) => {}
            None => included.push(token.to_string()),
        }
    }

    if included.is_empty() {
        included = detect_nics(env).iter().map(Nic::to_string).collect();
    }

    // Reverse lookup tables; keys lower-cased for case-insensitive match.
    let addr_table: BTreeMap<String, Vec<Nic>> = addrs_to_nics(env, &detect_nics(env))
        .into_iter()
        .map(|(addr, nics)| (addr.to_lowercase(), nics))
        .collect();
    let vip_table = vips_to_nics(&detect_vips(env));

    let excluded: BTreeSet<Nic> = excluded_tokens
        .iter()
        .flat_map(|token| resolve(decompose(token), &addr_table, &vip_table))
        .filter_map(|part| part.name)
        .collect();

    let mut interfaces = BTreeMap::new();

    for token in &included {
        for part in resolve(decompose(token), &addr_table, &vip_table) {
            let Some(name) = part.name else { continue };
            if excluded.contains(&name) {
                continue;
            }
            interfaces.entry(name).or_insert_with(Vec::new).push(part);
        }
    }

    interfaces
}

/// Splits a token into its (name, addr, port) parts.
///
/// A leading `eth<N>` is the name; `/` introduces the address and `@` the
/// port; a fragment with no marker at all is an address. Empty fragments
/// after a marker are dropped (`eth0/` has no address, `eth0/a@` no port).
fn decompose(token: &str) -> IfacePart {
    let (name, rest) = match NIC_TOKEN_RE.find(token) {
        Some(m) => (token[..m.end()].parse::<Nic>().ok(), &token[m.end()..]),
        None => (None, token),
    };

    let (addr_part, port) = match rest.split_once('@') {
        Some((before, after)) => (
            before,
            (!after.is_empty()).then(|| after.to_string()),
        ),
        None => (rest, None),
    };

    let addr_part = addr_part.strip_prefix('/').unwrap_or(addr_part);
    let addr = (!addr_part.is_empty()).then(|| addr_part.to_string());

    IfacePart { name, addr, port }
}

/// Resolves a nameless descriptor to concrete NICs via the reverse
/// address and VIP tables. Named descriptors pass through; descriptors
/// with neither name nor resolvable address vanish.
fn resolve(
    part: IfacePart,
    addr_table: &BTreeMap<String, Vec<Nic>>,
    vip_table: &BTreeMap<String, Vec<Nic>>,
) -> Vec<IfacePart> {
    if part.name.is_some() {
        return vec![part];
    }

    let Some(addr) = part.addr.as_deref() else {
        return Vec::new();
    };

    let key = addr.to_lowercase();
    let nics = addr_table.get(&key).or_else(|| vip_table.get(&key));

    nics.map(|nics| {
        nics.iter()
            .map(|nic| IfacePart {
                name: Some(*nic),
                ..part.clone()
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Reconstructs a textual token from a descriptor.
///
/// The name is always rendered when the address is absent, otherwise the
/// descriptor could render to nothing. The `/` separator appears only
/// when the name is requested alongside the address; `@port` only when a
/// port is present and requested.
pub fn render_interface(part: &IfacePart, name: bool, addr: bool, port: bool) -> String {
    let mut rendered = String::new();

    if name || part.addr.is_none() {
        if let Some(nic) = &part.name {
            rendered.push_str(&nic.to_string());
        }
    }

    if addr {
        if let Some(a) = &part.addr {
            if name {
                rendered.push('/');
            }
            rendered.push_str(a);
        }
    }

    if port {
        if let Some(p) = &part.port {
            rendered.push('@');
            rendered.push_str(p);
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nic(index: u32) -> Nic {
        Nic::new(index)
    }

    /// Four NICs; 10.0.0.1 is shared by eth0/eth2, eth1 carries two
    /// addresses via its VIP declaration.
    fn env() -> Env {
        [
            ("ETH0_IP", "10.0.0.1"),
            ("ETH1_IP", "10.0.1.1"),
            ("ETH2_IP", "10.0.0.1"),
            ("ETH3_IP", "10.0.3.1"),
            ("ONEAPP_VROUTER_ETH1_VIP0", "10.0.1.2/24"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_nil_expression_is_empty() {
        assert!(parse_interfaces(&env(), None).is_empty());
    }

    #[test]
    fn test_empty_expression_selects_all_nics() {
        let parsed = parse_interfaces(&env(), Some(""));

        assert_eq!(
            parsed,
            BTreeMap::from([
                (nic(0), vec![IfacePart::named(nic(0))]),
                (nic(1), vec![IfacePart::named(nic(1))]),
                (nic(2), vec![IfacePart::named(nic(2))]),
                (nic(3), vec![IfacePart::named(nic(3))]),
            ])
        );
    }

    #[test]
    fn test_address_token_fans_out_to_all_carriers() {
        let parsed = parse_interfaces(&env(), Some("10.0.0.1@53"));

        assert_eq!(
            parsed,
            BTreeMap::from([
                (
                    nic(0),
                    vec![IfacePart::named(nic(0)).with_addr("10.0.0.1").with_port("53")]
                ),
                (
                    nic(2),
                    vec![IfacePart::named(nic(2)).with_addr("10.0.0.1").with_port("53")]
                ),
            ])
        );
    }

    #[test]
    fn test_vip_address_resolves_after_addresses() {
        let parsed = parse_interfaces(&env(), Some("10.0.1.2"));

        assert_eq!(
            parsed,
            BTreeMap::from([(nic(1), vec![IfacePart::named(nic(1)).with_addr("10.0.1.2")])])
        );
    }

    #[test]
    fn test_multiple_tokens_for_one_nic_accumulate() {
        let parsed = parse_interfaces(&env(), Some("10.0.1.1@53 10.0.1.2@53"));

        assert_eq!(
            parsed,
            BTreeMap::from([(
                nic(1),
                vec![
                    IfacePart::named(nic(1)).with_addr("10.0.1.1").with_port("53"),
                    IfacePart::named(nic(1)).with_addr("10.0.1.2").with_port("53"),
                ]
            )])
        );
    }

    #[test]
    fn test_unknown_nic_name_is_kept_unknown_address_dropped() {
        let parsed = parse_interfaces(&env(), Some("eth7/10.0.0.7 172.31.0.1@53"));

        assert_eq!(
            parsed,
            BTreeMap::from([(nic(7), vec![IfacePart::named(nic(7)).with_addr("10.0.0.7")])])
        );
    }

    #[test]
    fn test_separator_variants() {
        let parsed = parse_interfaces(&env(), Some("eth0 eth1,eth2;eth3"));
        let names: Vec<String> = parsed.keys().map(Nic::to_string).collect();
        assert_eq!(names, vec!["eth0", "eth1", "eth2", "eth3"]);
    }

    #[test]
    fn test_dangling_markers() {
        let parsed = parse_interfaces(&env(), Some("eth0/10.0.0.1@"));
        assert_eq!(
            parsed,
            BTreeMap::from([(nic(0), vec![IfacePart::named(nic(0)).with_addr("10.0.0.1")])])
        );

        let parsed = parse_interfaces(&env(), Some("eth0/"));
        assert_eq!(
            parsed,
            BTreeMap::from([(nic(0), vec![IfacePart::named(nic(0))])])
        );
    }

    #[test]
    fn test_exclusion_by_name_and_address() {
        let parsed = parse_interfaces(&env(), Some("eth0/10.0.0.1@53 eth1 eth2 !10.0.1.1"));
        assert_eq!(
            parsed,
            BTreeMap::from([
                (
                    nic(0),
                    vec![IfacePart::named(nic(0)).with_addr("10.0.0.1").with_port("53")]
                ),
                (nic(2), vec![IfacePart::named(nic(2))]),
            ])
        );

        // Exclusion wins even when an address token names the same NIC.
        let parsed = parse_interfaces(&env(), Some("!eth1 10.0.1.1@53 eth3"));
        assert_eq!(
            parsed,
            BTreeMap::from([(nic(3), vec![IfacePart::named(nic(3))])])
        );
    }

    #[test]
    fn test_exclusion_only_expression_defaults_then_subtracts() {
        let parsed = parse_interfaces(&env(), Some("!eth0 !eth2"));
        let names: Vec<String> = parsed.keys().map(Nic::to_string).collect();
        assert_eq!(names, vec!["eth1", "eth3"]);

        let parsed = parse_interfaces(&env(), Some("!10.0.0.1"));
        let names: Vec<String> = parsed.keys().map(Nic::to_string).collect();
        assert_eq!(names, vec!["eth1", "eth3"]);
    }

    #[test]
    fn test_include_exclude_same_nic_yields_nothing() {
        let parsed = parse_interfaces(&env(), Some("eth0 !eth0"));
        assert!(!parsed.contains_key(&nic(0)));
    }

    #[test]
    fn test_bare_exclamation_is_discarded() {
        let parsed = parse_interfaces(&env(), Some("! eth3"));
        let names: Vec<String> = parsed.keys().map(Nic::to_string).collect();
        assert_eq!(names, vec!["eth3"]);
    }

    #[test]
    fn test_render_interface() {
        let cases = [
            (IfacePart::named(nic(0)), (true, false, false), "eth0"),
            (IfacePart::named(nic(0)), (false, false, false), "eth0"),
            (
                IfacePart::named(nic(0)).with_addr("10.0.0.1"),
                (true, false, false),
                "eth0",
            ),
            (
                IfacePart::named(nic(0)).with_addr("10.0.0.1"),
                (true, true, false),
                "eth0/10.0.0.1",
            ),
            (
                IfacePart::named(nic(0)).with_addr("10.0.0.1"),
                (false, true, false),
                "10.0.0.1",
            ),
            (
                IfacePart::named(nic(0)).with_addr("10.0.0.1").with_port("53"),
                (true, true, true),
                "eth0/10.0.0.1@53",
            ),
            (
                IfacePart::named(nic(0)).with_addr("10.0.0.1").with_port("53"),
                (true, true, false),
                "eth0/10.0.0.1",
            ),
            (
                IfacePart::named(nic(0)).with_addr("10.0.0.1").with_port("53"),
                (true, false, true),
                "eth0@53",
            ),
            (
                IfacePart::named(nic(0)).with_addr("10.0.0.1").with_port("53"),
                (false, true, true),
                "10.0.0.1@53",
            ),
        ];

        for (part, (name, addr, port), expected) in cases {
            assert_eq!(render_interface(&part, name, addr, port), expected);
        }
    }

    #[test]
    fn test_render_round_trip() {
        let part = IfacePart::named(nic(0)).with_addr("10.0.0.1").with_port("53");
        let rendered = render_interface(&part, true, true, true);
        assert_eq!(rendered, "eth0/10.0.0.1@53");

        let parsed = parse_interfaces(&env(), Some(&rendered));
        assert_eq!(parsed.get(&nic(0)), Some(&vec![part]));
    }
}
