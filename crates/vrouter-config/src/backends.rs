//! Load-balancer endpoint/backend reconciliation.
//!
//! Two symmetric parsers produce the same [`BackendSet`] shape: the
//! static one scans the flat environment (`ONEAPP_VNF_LB*` style names),
//! the dynamic one scans one lease's or one VM's reported attributes at a
//! time (`ONEGATE_LB*` style names, one backend per source). [`combine`]
//! restricts the dynamic set to the endpoints the static set declares and
//! merges at backend-key granularity; [`resolve`] substitutes `<NAME>`
//! placeholders with detected addresses.
//!
//! Incomplete declarations are dropped during promotion, never reported
//! as errors.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use vrouter_gate::{VmDoc, VnetDoc};
use vrouter_types::Env;

use crate::detect::AddrMap;
use crate::vars;

static STATIC_OPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_(IP|PORT|PROTOCOL|METHOD|SCHEDULER)$").expect("Invalid regex pattern"));

static STATIC_SERVER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_SERVER(\d+)_(HOST|PORT|WEIGHT|ULIMIT|LLIMIT)$").expect("Invalid regex pattern"));

static DYNAMIC_OPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_(ID|IP|PORT)$").expect("Invalid regex pattern"));

static DYNAMIC_SERVER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_SERVER_(HOST|PORT|WEIGHT|ULIMIT|LLIMIT)$").expect("Invalid regex pattern"));

/// Identifies one load-balancer endpoint: its index plus the listening
/// address and port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointKey {
    pub index: u32,
    pub ip: String,
    pub port: Option<String>,
}

impl EndpointKey {
    pub fn new(index: u32, ip: impl Into<String>, port: Option<&str>) -> Self {
        Self {
            index,
            ip: ip.into(),
            port: port.map(str::to_string),
        }
    }
}

/// Identifies one real server behind an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BackendKey {
    pub host: String,
    pub port: Option<String>,
}

impl BackendKey {
    pub fn new(host: impl Into<String>, port: Option<&str>) -> Self {
        Self {
            host: host.into(),
            port: port.map(str::to_string),
        }
    }
}

/// Declared or discovered attributes of one backend server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backend {
    pub host: Option<String>,
    pub port: Option<String>,
    pub weight: Option<String>,
    pub ulimit: Option<String>,
    pub llimit: Option<String>,
}

/// Per-endpoint option variables. The `id` field is only ever reported by
/// dynamic sources; `protocol`, `method` and `scheduler` only by static
/// declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOptions {
    pub id: Option<String>,
    pub ip: Option<String>,
    pub port: Option<String>,
    pub protocol: Option<String>,
    pub method: Option<String>,
    pub scheduler: Option<String>,
}

impl EndpointOptions {
    fn merge(&mut self, other: EndpointOptions) {
        let EndpointOptions {
            id,
            ip,
            port,
            protocol,
            method,
            scheduler,
        } = other;
        if id.is_some() {
            self.id = id;
        }
        if ip.is_some() {
            self.ip = ip;
        }
        if port.is_some() {
            self.port = port;
        }
        if protocol.is_some() {
            self.protocol = protocol;
        }
        if method.is_some() {
            self.method = method;
        }
        if scheduler.is_some() {
            self.scheduler = scheduler;
        }
    }
}

/// The parsed load-balancer configuration of one source.
///
/// Every endpoint key in `by_endpoint` pairs with the `options` entry of
/// the same index; [`combine`] and [`resolve`] preserve that pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSet {
    pub by_endpoint: BTreeMap<EndpointKey, BTreeMap<BackendKey, Backend>>,
    pub options: BTreeMap<u32, EndpointOptions>,
}

impl BackendSet {
    /// Deep-merges another set into this one. Options merge field-wise,
    /// backend maps merge at backend-key granularity, `other` winning.
    pub fn merge(&mut self, other: BackendSet) {
        for (index, opts) in other.options {
            match self.options.entry(index) {
                std::collections::btree_map::Entry::Vacant(e) => {
                    e.insert(opts);
                }
                std::collections::btree_map::Entry::Occupied(mut e) => e.get_mut().merge(opts),
            }
        }
        for (endpoint, backends) in other.by_endpoint {
            self.by_endpoint.entry(endpoint).or_default().extend(backends);
        }
    }
}

/// Parses statically declared load balancers from the environment.
///
/// `<prefix><idx>_IP|PORT|PROTOCOL|METHOD|SCHEDULER` populate per-index
/// options; `<prefix><idx>_SERVER<sidx>_HOST|PORT|WEIGHT|ULIMIT|LLIMIT`
/// populate provisional backends. A provisional backend is promoted only
/// when the endpoint has an address and the backend a host; missing ports
/// are tolerated only with `allow_nil_ports`.
pub fn parse_static(env: &Env, prefix: &str, allow_nil_ports: bool) -> BackendSet {
    let mut set = BackendSet::default();
    let mut provisional: BTreeMap<(u32, u32), Backend> = BTreeMap::new();

    for (name, value) in env.iter() {
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };

        if let Some(caps) = STATIC_OPT_RE.captures(rest) {
            if let Ok(index) = caps[1].parse::<u32>() {
                set_option(set.options.entry(index).or_default(), &caps[2], value);
            }
        } else if let Some(caps) = STATIC_SERVER_RE.captures(rest) {
            if let (Ok(index), Ok(sidx)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
                set_backend(provisional.entry((index, sidx)).or_default(), &caps[3], value);
            }
        }
    }

    for ((index, _), backend) in provisional {
        promote(&mut set, index, backend, allow_nil_ports);
    }

    set
}

/// Parses one dynamic source's reported attributes.
///
/// Dynamic names carry no server index because each lease or VM reports
/// exactly one backend. With an `id_filter`, indices whose reported `ID`
/// is present and differs from the filter are dropped. Promotion is
/// strict: endpoint ip/port and backend host/port must all be present.
pub fn parse_dynamic(
    attrs: &serde_json::Map<String, Value>,
    prefix: &str,
    id_filter: Option<&str>,
) -> BackendSet {
    let mut set = BackendSet::default();
    let mut provisional: BTreeMap<u32, Backend> = BTreeMap::new();

    for (name, value) in attrs {
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };
        let Some(value) = attr_value(value) else {
            debug!("ignoring non-scalar attribute {}", name);
            continue;
        };

        if let Some(caps) = DYNAMIC_OPT_RE.captures(rest) {
            if let Ok(index) = caps[1].parse::<u32>() {
                set_option(set.options.entry(index).or_default(), &caps[2], &value);
            }
        } else if let Some(caps) = DYNAMIC_SERVER_RE.captures(rest) {
            if let Ok(index) = caps[1].parse::<u32>() {
                set_backend(provisional.entry(index).or_default(), &caps[2], &value);
            }
        }
    }

    if let Some(filter) = id_filter {
        let rejected: Vec<u32> = set
            .options
            .iter()
            .filter(|(_, opts)| {
                opts.id.as_deref().map(|id| !id.is_empty() && id != filter) == Some(true)
            })
            .map(|(index, _)| *index)
            .collect();
        for index in rejected {
            set.options.remove(&index);
            provisional.remove(&index);
        }
    }

    for (index, backend) in provisional {
        promote(&mut set, index, backend, false);
    }

    set
}

fn set_option(opts: &mut EndpointOptions, field: &str, value: &str) {
    let value = Some(value.to_string());
    match field {
        "ID" => opts.id = value,
        "IP" => opts.ip = value,
        "PORT" => opts.port = value,
        "PROTOCOL" => opts.protocol = value,
        "METHOD" => opts.method = value,
        "SCHEDULER" => opts.scheduler = value,
        _ => unreachable!("field set is closed by the patterns"),
    }
}

fn set_backend(backend: &mut Backend, field: &str, value: &str) {
    let value = Some(value.to_string());
    match field {
        "HOST" => backend.host = value,
        "PORT" => backend.port = value,
        "WEIGHT" => backend.weight = value,
        "ULIMIT" => backend.ulimit = value,
        "LLIMIT" => backend.llimit = value,
        _ => unreachable!("field set is closed by the patterns"),
    }
}

fn promote(set: &mut BackendSet, index: u32, backend: Backend, allow_nil_ports: bool) {
    let Some(opts) = set.options.get(&index) else {
        return;
    };
    let Some(ip) = opts.ip.clone() else {
        return;
    };
    if !allow_nil_ports && opts.port.is_none() {
        return;
    }
    let Some(host) = backend.host.clone() else {
        return;
    };
    if !allow_nil_ports && backend.port.is_none() {
        return;
    }

    let endpoint = EndpointKey {
        index,
        ip,
        port: opts.port.clone(),
    };
    let key = BackendKey {
        host,
        port: backend.port.clone(),
    };
    set.by_endpoint.entry(endpoint).or_default().insert(key, backend);
}

fn attr_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses the statically declared load balancers.
pub fn from_env(env: &Env, prefix: &str, allow_nil_ports: bool) -> BackendSet {
    parse_static(env, prefix, allow_nil_ports)
}

/// Collects dynamic backends from every backend-flagged lease of the
/// given virtual networks.
pub fn from_vnets(vnets: &[VnetDoc], prefix: &str, id_filter: Option<&str>) -> BackendSet {
    let mut set = BackendSet::default();

    for vnet in vnets {
        for lease in vnet.vnet.leases().filter(|lease| lease.is_backend()) {
            set.merge(parse_dynamic(&lease.attrs, prefix, id_filter));
        }
    }

    set
}

/// Collects dynamic backends from the user templates of the given VMs.
pub fn from_vms(vms: &[VmDoc], prefix: &str, id_filter: Option<&str>) -> BackendSet {
    let mut set = BackendSet::default();

    for vm in vms {
        set.merge(parse_dynamic(&vm.vm.user_template, prefix, id_filter));
    }

    set
}

/// Merges dynamic backends into the static configuration.
///
/// The static options define the authoritative endpoint universe. A
/// dynamic endpoint survives only when its `(index, ip, port)` triple
/// exactly matches a static option; surviving backends are merged on top
/// of the static ones at backend-key granularity. The result keeps the
/// static options unchanged.
pub fn combine(static_set: &BackendSet, dynamic_set: &BackendSet) -> BackendSet {
    let universe: BTreeSet<(u32, Option<&str>, Option<&str>)> = static_set
        .options
        .iter()
        .map(|(index, opts)| (*index, opts.ip.as_deref(), opts.port.as_deref()))
        .collect();

    let mut combined = static_set.clone();

    for (endpoint, backends) in &dynamic_set.by_endpoint {
        let triple = (
            endpoint.index,
            Some(endpoint.ip.as_str()),
            endpoint.port.as_deref(),
        );
        if !universe.contains(&triple) {
            debug!(
                "dropping dynamic endpoint {}:{:?} not declared statically",
                endpoint.ip, endpoint.port
            );
            continue;
        }
        combined
            .by_endpoint
            .entry(endpoint.clone())
            .or_default()
            .extend(backends.clone());
    }

    combined
}

/// Substitutes `<NAME>` placeholders in endpoint addresses.
///
/// The lookup table merges the three detection passes; endpoints win over
/// virtual IPs, which win over addresses. Unknown placeholders fall back
/// to the original string. Every resulting address has its CIDR suffix
/// stripped, so resolving an already-resolved set is a no-op.
pub fn resolve(
    set: &BackendSet,
    addrs: &AddrMap,
    vips: &AddrMap,
    endpoints: &AddrMap,
) -> BackendSet {
    let mut table: BTreeMap<String, String> = BTreeMap::new();
    for source in [addrs, vips, endpoints] {
        for declarations in source.values() {
            table.extend(declarations.clone());
        }
    }

    let mut resolved = BackendSet {
        by_endpoint: BTreeMap::new(),
        options: set.options.clone(),
    };

    for (endpoint, backends) in &set.by_endpoint {
        let mut endpoint = endpoint.clone();
        endpoint.ip = interpolate(&endpoint.ip, &table);
        resolved
            .by_endpoint
            .entry(endpoint)
            .or_default()
            .extend(backends.clone());
    }

    for opts in resolved.options.values_mut() {
        if let Some(ip) = &opts.ip {
            opts.ip = Some(interpolate(ip, &table));
        }
    }

    resolved
}

fn interpolate(value: &str, table: &BTreeMap<String, String>) -> String {
    let looked_up = vars::PLACEHOLDER_RE
        .captures(value)
        .and_then(|caps| table.get(&caps[1]))
        .map(String::as_str)
        .unwrap_or(value);

    strip_cidr(looked_up)
}

fn strip_cidr(value: &str) -> String {
    value.split('/').next().unwrap_or(value).to_string()
}
