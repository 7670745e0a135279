//! Configuration derivation core for the virtual-router appliance.
//!
//! Given an immutable [`Env`](vrouter_types::Env) snapshot of
//! contextualization variables and, optionally, control-plane records
//! fetched through [`vrouter_gate`], this crate derives everything the
//! surrounding services consume:
//!
//! - [`detect`]: per-NIC address, virtual-IP and endpoint declarations
//! - [`cidr`]: prefix-length inference for bare addresses
//! - [`interfaces`]: the interface-selection expression grammar
//! - [`subnets`]: subnet strings and usable address ranges
//! - [`backends`]: the load-balancer endpoint/backend reconciliation
//!   pipeline (static + dynamic sources, merge, placeholder resolution)
//!
//! All derivation is synchronous and side-effect-free: every call
//! recomputes from the snapshot it is given, and "failure" is expressed
//! as data being absent from the output, never as an error value.

pub mod backends;
pub mod cidr;
pub mod detect;
pub mod interfaces;
pub mod subnets;
pub mod vars;

pub use backends::{
    combine, from_env, from_vms, from_vnets, resolve, Backend, BackendKey, BackendSet,
    EndpointKey, EndpointOptions,
};
pub use detect::{
    detect_addrs, detect_endpoints, detect_mgmt_nics, detect_nics, detect_vips, AddrMap,
};
pub use interfaces::{parse_interfaces, render_interface, IfacePart};
pub use subnets::{addrs_to_subnets, subnets_to_ranges, vips_to_subnets};
