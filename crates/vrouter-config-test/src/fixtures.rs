//! Test fixtures for the configuration derivation pipeline
//!
//! Provides a builder for contextualization snapshots and canned
//! control-plane documents wired into a [`StaticGate`].

use std::collections::BTreeMap;

use serde_json::json;
use vrouter_gate::{RouterDoc, ServiceDoc, StaticGate, VmDoc, VnetDoc};
use vrouter_types::Env;

/// Builds a contextualization snapshot variable by variable.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    vars: BTreeMap<String, String>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary variable.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Declare a NIC's primary address.
    pub fn nic(self, index: u32, ip: &str) -> Self {
        self.var(format!("ETH{}_IP", index), ip)
    }

    /// Declare a NIC's primary address together with its netmask.
    pub fn nic_masked(self, index: u32, ip: &str, mask: &str) -> Self {
        self.nic(index, ip).var(format!("ETH{}_MASK", index), mask)
    }

    /// Declare a virtual IP slot on a NIC.
    pub fn vip(self, index: u32, slot: u32, value: &str) -> Self {
        self.var(format!("ONEAPP_VROUTER_ETH{}_VIP{}", index, slot), value)
    }

    /// Mark a NIC as management-only.
    pub fn management(self, index: u32) -> Self {
        self.var(format!("ETH{}_VROUTER_MANAGEMENT", index), "YES")
    }

    /// Declare a static load-balancer endpoint.
    pub fn lb(self, index: u32, ip: &str, port: &str) -> Self {
        self.var(format!("ONEAPP_VNF_LB{}_IP", index), ip)
            .var(format!("ONEAPP_VNF_LB{}_PORT", index), port)
    }

    /// Declare one static backend server behind an endpoint.
    pub fn lb_server(self, index: u32, sidx: u32, host: &str, port: &str) -> Self {
        self.var(format!("ONEAPP_VNF_LB{}_SERVER{}_HOST", index, sidx), host)
            .var(format!("ONEAPP_VNF_LB{}_SERVER{}_PORT", index, sidx), port)
    }

    pub fn build(self) -> Env {
        Env::from(self.vars)
    }
}

/// Router document with the given attached network ids.
pub fn router_doc(network_ids: &[&str]) -> RouterDoc {
    let nics: Vec<_> = network_ids
        .iter()
        .enumerate()
        .map(|(nic_id, network_id)| {
            json!({ "NIC_ID": nic_id.to_string(), "NETWORK_ID": network_id })
        })
        .collect();

    serde_json::from_value(json!({
        "VROUTER": {
            "ID": "86",
            "NAME": "vrouter",
            "TEMPLATE": { "NIC": nics }
        }
    }))
    .expect("Invalid fixture document")
}

/// Virtual-network document with free-form leases.
pub fn vnet_doc(id: &str, parent: Option<&str>, leases: Vec<serde_json::Value>) -> VnetDoc {
    let parent = match parent {
        Some(parent) => json!(parent),
        None => json!({}),
    };

    serde_json::from_value(json!({
        "VNET": {
            "ID": id,
            "PARENT_NETWORK_ID": parent,
            "AR_POOL": {
                "AR": [ { "AR_ID": "0", "LEASES": { "LEASE": leases } } ]
            }
        }
    }))
    .expect("Invalid fixture document")
}

/// Dynamic load-balancer attributes under generated `ONEGATE_LB*` names.
fn gate_lb_attrs(lb_index: u32, host: &str, port: &str) -> Vec<(String, serde_json::Value)> {
    vec![
        (format!("ONEGATE_LB{}_IP", lb_index), json!("10.2.11.86")),
        (format!("ONEGATE_LB{}_PORT", lb_index), json!("6969")),
        (format!("ONEGATE_LB{}_SERVER_HOST", lb_index), json!(host)),
        (format!("ONEGATE_LB{}_SERVER_PORT", lb_index), json!(port)),
    ]
}

/// One lease advertising a dynamic load-balancer backend.
pub fn backend_lease(ip: &str, lb_index: u32, host: &str, port: &str) -> serde_json::Value {
    let mut lease = json!({
        "IP": ip,
        "VM": "167",
        "BACKEND": "YES",
    });
    let attrs = lease.as_object_mut().expect("Invalid fixture document");
    attrs.extend(gate_lb_attrs(lb_index, host, port));
    lease
}

/// Service document with one role spanning the given VM ids.
pub fn service_doc(vm_ids: &[&str]) -> ServiceDoc {
    let nodes: Vec<_> = vm_ids
        .iter()
        .map(|id| json!({ "vm_info": { "VM": { "ID": id } } }))
        .collect();

    serde_json::from_value(json!({
        "SERVICE": {
            "name": "asd",
            "roles": [ { "name": "server", "nodes": nodes } ]
        }
    }))
    .expect("Invalid fixture document")
}

/// VM document whose user template declares one dynamic backend.
pub fn backend_vm_doc(id: &str, lb_index: u32, host: &str, port: &str) -> VmDoc {
    let mut user_template = json!({
        "ROLE_NAME": "server",
        "SERVICE_ID": "23",
    });
    user_template
        .as_object_mut()
        .expect("Invalid fixture document")
        .extend(gate_lb_attrs(lb_index, host, port));

    serde_json::from_value(json!({
        "VM": {
            "ID": id,
            "NAME": format!("server_{}_(service_23)", id),
            "USER_TEMPLATE": user_template
        }
    }))
    .expect("Invalid fixture document")
}

/// A gate covering the common topology: two attached networks, one of
/// them carrying a chained reservation, plus a two-VM service.
pub fn sample_gate() -> StaticGate {
    StaticGate::new()
        .with_router(router_doc(&["0", "1"]))
        .with_vnet(
            "0",
            vnet_doc(
                "0",
                None,
                vec![
                    backend_lease("10.2.11.200", 0, "asd0", "1234"),
                    backend_lease("10.2.11.201", 0, "asd1", "1234"),
                ],
            ),
        )
        .with_vnet(
            "1",
            vnet_doc(
                "1",
                None,
                vec![json!({ "IP": "172.20.0.100", "VNET": "40" })],
            ),
        )
        .with_vnet(
            "40",
            vnet_doc(
                "40",
                Some("1"),
                vec![backend_lease("172.20.0.122", 0, "asd2", "1234")],
            ),
        )
        .with_service(service_doc(&["435", "436"]))
        .with_vm("435", backend_vm_doc("435", 0, "10.2.11.202", "2345"))
        .with_vm("436", backend_vm_doc("436", 0, "10.2.11.203", "2345"))
}
