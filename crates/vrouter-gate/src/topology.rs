//! Read-only traversals over control-plane graphs.
//!
//! Both walks use an explicit work-list with a visited set, so chained
//! reservations that point back at an already-fetched network terminate
//! instead of recursing, and every record is fetched at most once.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::gate::Gate;
use crate::records::{scalar_id, VmDoc, VnetDoc};

/// Resolves the closure of virtual networks reachable from the router.
///
/// Seeds from the distinct network ids attached to the router's NICs,
/// then follows each network's declared parent and every network
/// referenced by a lease within its address-range pool. Fetch failures
/// skip the affected branch; the traversal itself never fails.
pub fn vrouter_vnets(gate: &dyn Gate) -> Vec<VnetDoc> {
    let router = match gate.vrouter() {
        Ok(doc) => doc,
        Err(err) => {
            warn!("vrouter record unavailable: {}", err);
            return Vec::new();
        }
    };

    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut worklist: VecDeque<String> = VecDeque::new();

    for nic in &router.vrouter.template.nic {
        if let Some(id) = nic.network_id.as_ref().and_then(scalar_id) {
            if visited.insert(id.clone()) {
                worklist.push_back(id);
            }
        }
    }

    debug!(
        "resolving vnet closure from {} attached network(s)",
        worklist.len()
    );

    let mut vnets = Vec::new();

    while let Some(network_id) = worklist.pop_front() {
        let doc = match gate.vnet(&network_id) {
            Ok(doc) => doc,
            Err(err) => {
                warn!("skipping vnet {}: {}", network_id, err);
                continue;
            }
        };

        if let Some(parent) = doc.vnet.parent_network_id.as_ref().and_then(scalar_id) {
            if visited.insert(parent.clone()) {
                worklist.push_back(parent);
            }
        }

        // Chained reservations: leases may reference further networks.
        for lease in doc.vnet.leases() {
            if let Some(id) = lease.vnet.as_ref().and_then(scalar_id) {
                if visited.insert(id.clone()) {
                    worklist.push_back(id);
                }
            }
        }

        vnets.push(doc);
    }

    vnets
}

/// Lists the VMs of the service this appliance belongs to (OneFlow).
///
/// Collects the distinct VM ids across all roles and nodes, then fetches
/// each VM record, skipping any that fail to fetch.
pub fn service_vms(gate: &dyn Gate) -> Vec<VmDoc> {
    let service = match gate.service() {
        Ok(doc) => doc,
        Err(err) => {
            warn!("service record unavailable: {}", err);
            return Vec::new();
        }
    };

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut vm_ids: Vec<String> = Vec::new();

    for role in &service.service.roles {
        for node in &role.nodes {
            let id = node
                .vm_info
                .as_ref()
                .and_then(|info| info.vm.as_ref())
                .and_then(|vm| vm.id.as_ref())
                .and_then(scalar_id);

            if let Some(id) = id {
                if seen.insert(id.clone()) {
                    vm_ids.push(id);
                }
            }
        }
    }

    vm_ids
        .iter()
        .filter_map(|vm_id| match gate.vm(vm_id) {
            Ok(doc) => Some(doc),
            Err(err) => {
                warn!("skipping vm {}: {}", vm_id, err);
                None
            }
        })
        .collect()
}
