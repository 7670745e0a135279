//! Control-plane records and topology traversal for the virtual-router
//! appliance.
//!
//! The appliance learns about its surroundings from an orchestration
//! control plane (OneGate). This crate provides:
//!
//! - [`Gate`]: the record-fetching collaborator trait (router, virtual
//!   network, service and VM documents)
//! - [`records`]: serde document types for the JSON the control plane
//!   reports
//! - [`StaticGate`]: a gate serving pre-loaded documents, used to replay
//!   captured snapshots and in tests
//! - [`topology`]: read-only traversals over the virtual-network and
//!   service-VM graphs
//!
//! Fetch failures are never fatal to a traversal: a record that cannot be
//! fetched is treated as absent and the branch is skipped.

pub mod error;
pub mod gate;
pub mod records;
pub mod topology;

pub use error::{GateError, GateResult};
pub use gate::{Gate, StaticGate};
pub use records::{scalar_id, RouterDoc, ServiceDoc, VmDoc, VnetDoc};
pub use topology::{service_vms, vrouter_vnets};
