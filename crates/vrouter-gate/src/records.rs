//! Document types for control-plane JSON records.
//!
//! Only the fields the derivation core actually reads are typed; anything
//! else the control plane reports is ignored by serde, except for lease
//! and VM user-template attributes, which are kept as free-form maps
//! because load-balancer declarations (`ONEGATE_LB*`) live there under
//! generated names.
//!
//! Identifier fields (`NETWORK_ID`, `PARENT_NETWORK_ID`, `VNET`, `ID`) are
//! kept as raw JSON values: real documents carry them as strings, numbers,
//! or (for an unset parent) an empty object. [`scalar_id`] normalizes
//! them; a non-scalar value counts as "not declared".

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalizes a raw identifier value to a string, if it is a scalar.
pub fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Top-level document of a `vrouter show` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterDoc {
    #[serde(rename = "VROUTER", default)]
    pub vrouter: Router,
}

/// The virtual-router record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Router {
    #[serde(rename = "ID", default)]
    pub id: Option<Value>,

    #[serde(rename = "NAME", default)]
    pub name: Option<String>,

    #[serde(rename = "TEMPLATE", default)]
    pub template: RouterTemplate,
}

/// The router template, carrying its NIC attachments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterTemplate {
    #[serde(rename = "NIC", default)]
    pub nic: Vec<RouterNic>,
}

/// One NIC attachment of the router.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterNic {
    #[serde(rename = "NIC_ID", default)]
    pub nic_id: Option<Value>,

    #[serde(rename = "NETWORK_ID", default)]
    pub network_id: Option<Value>,
}

/// Top-level document of a `vnet show` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VnetDoc {
    #[serde(rename = "VNET", default)]
    pub vnet: Vnet,
}

/// A virtual-network record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vnet {
    #[serde(rename = "ID", default)]
    pub id: Option<Value>,

    #[serde(rename = "NAME", default)]
    pub name: Option<String>,

    /// Parent network of a reservation; `{}` when unset.
    #[serde(rename = "PARENT_NETWORK_ID", default)]
    pub parent_network_id: Option<Value>,

    #[serde(rename = "AR_POOL", default)]
    pub ar_pool: ArPool,
}

impl Vnet {
    /// Iterates over every lease in the address-range pool.
    pub fn leases(&self) -> impl Iterator<Item = &Lease> {
        self.ar_pool
            .ar
            .iter()
            .flat_map(|ar| ar.leases.lease.iter())
    }
}

/// The address-range pool of a virtual network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArPool {
    #[serde(rename = "AR", default)]
    pub ar: Vec<AddressRange>,
}

/// One address range within a pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressRange {
    #[serde(rename = "AR_ID", default)]
    pub ar_id: Option<Value>,

    #[serde(rename = "LEASES", default)]
    pub leases: Leases,
}

/// The lease list of an address range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leases {
    #[serde(rename = "LEASE", default)]
    pub lease: Vec<Lease>,
}

/// One lease. Known fields are typed; everything else (including the
/// `ONEGATE_LB*` backend declarations) stays in [`Lease::attrs`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    #[serde(rename = "IP", default)]
    pub ip: Option<String>,

    #[serde(rename = "VM", default)]
    pub vm: Option<Value>,

    /// Network id of a chained reservation carved out of this lease.
    #[serde(rename = "VNET", default)]
    pub vnet: Option<Value>,

    /// `"YES"` when the lease advertises itself as a load-balancer backend.
    #[serde(rename = "BACKEND", default)]
    pub backend: Option<String>,

    #[serde(flatten)]
    pub attrs: serde_json::Map<String, Value>,
}

impl Lease {
    /// Returns true if this lease advertises itself as a backend.
    pub fn is_backend(&self) -> bool {
        self.backend.as_deref() == Some("YES")
    }
}

/// Top-level document of a `service show` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDoc {
    #[serde(rename = "SERVICE", default)]
    pub service: Service,
}

/// A service (OneFlow) record. Role and node fields are lower-case in the
/// reported JSON, unlike everything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub roles: Vec<Role>,
}

/// One role of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// One node of a role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub vm_info: Option<VmInfo>,
}

/// The VM summary nested inside a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmInfo {
    #[serde(rename = "VM", default)]
    pub vm: Option<VmSummary>,
}

/// Identifier-only VM summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmSummary {
    #[serde(rename = "ID", default)]
    pub id: Option<Value>,
}

/// Top-level document of a `vm show` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmDoc {
    #[serde(rename = "VM", default)]
    pub vm: Vm,
}

/// A VM record. The user template is free-form; backend declarations
/// (`ONEGATE_LB*`) live there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vm {
    #[serde(rename = "ID", default)]
    pub id: Option<Value>,

    #[serde(rename = "NAME", default)]
    pub name: Option<String>,

    #[serde(rename = "USER_TEMPLATE", default)]
    pub user_template: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_id() {
        assert_eq!(scalar_id(&Value::String("40".into())), Some("40".into()));
        assert_eq!(scalar_id(&serde_json::json!(40)), Some("40".into()));
        assert_eq!(scalar_id(&serde_json::json!({})), None);
        assert_eq!(scalar_id(&Value::Null), None);
        assert_eq!(scalar_id(&Value::String(String::new())), None);
    }

    #[test]
    fn test_lease_attrs_flatten() {
        let lease: Lease = serde_json::from_value(serde_json::json!({
            "IP": "10.2.11.202",
            "MAC": "02:00:0a:02:0b:ca",
            "VM": "167",
            "BACKEND": "YES",
            "ONEGATE_LB0_IP": "10.2.11.86",
            "ONEGATE_LB0_PORT": "6969"
        }))
        .unwrap();

        assert!(lease.is_backend());
        assert_eq!(lease.ip.as_deref(), Some("10.2.11.202"));
        assert_eq!(
            lease.attrs.get("ONEGATE_LB0_IP").and_then(Value::as_str),
            Some("10.2.11.86")
        );
        // Typed fields must not leak into the free-form map.
        assert!(!lease.attrs.contains_key("BACKEND"));
    }

    #[test]
    fn test_parent_network_id_empty_object() {
        let doc: VnetDoc = serde_json::from_value(serde_json::json!({
            "VNET": { "ID": "0", "PARENT_NETWORK_ID": {} }
        }))
        .unwrap();

        let parent = doc.vnet.parent_network_id.as_ref().and_then(scalar_id);
        assert_eq!(parent, None);
    }

    #[test]
    fn test_service_roles_lowercase() {
        let doc: ServiceDoc = serde_json::from_value(serde_json::json!({
            "SERVICE": {
                "name": "asd",
                "roles": [
                    { "name": "server",
                      "nodes": [ { "vm_info": { "VM": { "ID": "435" } } } ] }
                ]
            }
        }))
        .unwrap();

        let id = doc.service.roles[0].nodes[0]
            .vm_info
            .as_ref()
            .and_then(|i| i.vm.as_ref())
            .and_then(|vm| vm.id.as_ref())
            .and_then(scalar_id);
        assert_eq!(id, Some("435".into()));
    }
}
