//! The record-fetching collaborator trait.

use std::collections::BTreeMap;

use crate::error::{GateError, GateResult};
use crate::records::{RouterDoc, ServiceDoc, VmDoc, VnetDoc};

/// Read-only access to control-plane records.
///
/// Implementations are plain blocking request/response calls; the core
/// owns no timeout or retry policy. Callers treat any error as "record
/// absent" and skip the affected branch.
pub trait Gate {
    /// Fetches the virtual-router record of this appliance.
    fn vrouter(&self) -> GateResult<RouterDoc>;

    /// Fetches a virtual-network record by id.
    fn vnet(&self, network_id: &str) -> GateResult<VnetDoc>;

    /// Fetches the service (OneFlow) record this appliance belongs to.
    fn service(&self) -> GateResult<ServiceDoc>;

    /// Fetches a VM record by id.
    fn vm(&self, vm_id: &str) -> GateResult<VmDoc>;
}

/// A [`Gate`] serving pre-loaded documents.
///
/// Useful for replaying a captured control-plane snapshot and as the test
/// double for traversal logic. Lookups for documents that were never
/// loaded fail with [`GateError::NotFound`], which traversals treat the
/// same as any other fetch failure.
#[derive(Debug, Clone, Default)]
pub struct StaticGate {
    router: Option<RouterDoc>,
    service: Option<ServiceDoc>,
    vnets: BTreeMap<String, VnetDoc>,
    vms: BTreeMap<String, VmDoc>,
}

impl StaticGate {
    /// Creates an empty gate; every fetch fails until documents are loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the router document.
    pub fn with_router(mut self, doc: RouterDoc) -> Self {
        self.router = Some(doc);
        self
    }

    /// Loads the service document.
    pub fn with_service(mut self, doc: ServiceDoc) -> Self {
        self.service = Some(doc);
        self
    }

    /// Loads a virtual-network document under the given id.
    pub fn with_vnet(mut self, network_id: impl Into<String>, doc: VnetDoc) -> Self {
        self.vnets.insert(network_id.into(), doc);
        self
    }

    /// Loads a VM document under the given id.
    pub fn with_vm(mut self, vm_id: impl Into<String>, doc: VmDoc) -> Self {
        self.vms.insert(vm_id.into(), doc);
        self
    }
}

impl Gate for StaticGate {
    fn vrouter(&self) -> GateResult<RouterDoc> {
        self.router
            .clone()
            .ok_or_else(|| GateError::not_found("vrouter", ""))
    }

    fn vnet(&self, network_id: &str) -> GateResult<VnetDoc> {
        self.vnets
            .get(network_id)
            .cloned()
            .ok_or_else(|| GateError::not_found("vnet", network_id))
    }

    fn service(&self) -> GateResult<ServiceDoc> {
        self.service
            .clone()
            .ok_or_else(|| GateError::not_found("service", ""))
    }

    fn vm(&self, vm_id: &str) -> GateResult<VmDoc> {
        self.vms
            .get(vm_id)
            .cloned()
            .ok_or_else(|| GateError::not_found("vm", vm_id))
    }
}
