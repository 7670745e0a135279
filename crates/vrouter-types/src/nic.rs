//! Logical NIC identifiers.

use crate::ParseError;
use std::fmt;
use std::str::FromStr;

/// A logical network interface of the appliance, named `eth<N>`.
///
/// Ordering is numeric by `N`, not lexicographic, so `eth2 < eth10`.
/// Using `Nic` as a `BTreeMap` key therefore yields interfaces in
/// ascending numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nic(u32);

impl Nic {
    /// Creates a NIC identifier from its index.
    pub const fn new(index: u32) -> Self {
        Nic(index)
    }

    /// Returns the numeric index (the `N` in `eth<N>`).
    pub const fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Nic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "eth{}", self.0)
    }
}

impl FromStr for Nic {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .strip_prefix("eth")
            .and_then(|digits| {
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    digits.parse::<u32>().ok()
                }
            })
            .ok_or_else(|| ParseError::InvalidNicName(s.to_string()))?;

        Ok(Nic(index))
    }
}
