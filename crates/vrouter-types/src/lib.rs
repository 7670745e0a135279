//! Common types for the virtual-router configuration core.
//!
//! This crate provides type-safe representations of the primitives used
//! throughout the appliance configuration pipeline:
//!
//! - [`Nic`]: logical network interfaces (`eth<N>`), ordered numerically
//! - [`Env`]: an immutable snapshot of contextualization variables
//! - [`IpNet`]: IP prefixes (CIDR notation) with subnet arithmetic

mod env;
mod ip;
mod nic;

pub use env::Env;
pub use ip::{netmask_prefix_len, IpNet};
pub use nic::Nic;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid NIC name: {0} (expected eth<N>)")]
    InvalidNicName(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid netmask: {0}")]
    InvalidNetmask(String),
}
