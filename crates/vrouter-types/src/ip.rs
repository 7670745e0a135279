//! IP prefix parsing and subnet arithmetic.

use crate::ParseError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// An IP prefix in CIDR notation (e.g. `10.0.0.1/24` or `2001:db8::/64`).
///
/// Unlike a pure network type, the address part may carry host bits; the
/// contextualization variables declare interface addresses this way
/// (`address/prefixlen`). [`IpNet::network`] masks the host bits off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNet {
    address: IpAddr,
    prefix_len: u8,
}

impl IpNet {
    /// Creates a new prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length is invalid for the address
    /// family (>32 for IPv4, >128 for IPv6).
    pub fn new(address: IpAddr, prefix_len: u8) -> Result<Self, ParseError> {
        let max_len = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if prefix_len > max_len {
            return Err(ParseError::InvalidIpPrefix(format!(
                "prefix length {} exceeds maximum {} for address family",
                prefix_len, max_len
            )));
        }

        Ok(IpNet {
            address,
            prefix_len,
        })
    }

    /// Returns the address part.
    pub const fn address(&self) -> &IpAddr {
        &self.address
    }

    /// Returns the prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns true if this is an IPv6 prefix.
    pub const fn is_ipv6(&self) -> bool {
        matches!(self.address, IpAddr::V6(_))
    }

    /// Returns the maximum prefix length for the address family.
    pub const fn max_prefix_len(&self) -> u8 {
        match self.address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }

    /// Returns the address as an integer (IPv4 in the low 32 bits).
    pub fn bits(&self) -> u128 {
        match self.address {
            IpAddr::V4(addr) => u32::from(addr) as u128,
            IpAddr::V6(addr) => u128::from(addr),
        }
    }

    /// Returns the netmask as an integer.
    fn mask_bits(&self) -> u128 {
        let host_bits = (self.max_prefix_len() - self.prefix_len) as u32;
        let full: u128 = match self.address {
            IpAddr::V4(_) => u32::MAX as u128,
            IpAddr::V6(_) => u128::MAX,
        };
        if host_bits == 0 {
            full
        } else {
            full & !((1u128 << host_bits) - 1)
        }
    }

    /// Returns the containing network (host bits masked off).
    pub fn network(&self) -> IpNet {
        IpNet {
            address: self.addr_from_bits(self.bits() & self.mask_bits()),
            prefix_len: self.prefix_len,
        }
    }

    /// Returns the numeric value of the first address of the block.
    pub fn first(&self) -> u128 {
        self.bits() & self.mask_bits()
    }

    /// Returns the numeric value of the last address of the block.
    pub fn last(&self) -> u128 {
        let full: u128 = match self.address {
            IpAddr::V4(_) => u32::MAX as u128,
            IpAddr::V6(_) => u128::MAX,
        };
        self.first() | (full & !self.mask_bits())
    }

    /// Converts an integer back to an address of the same family.
    pub fn addr_from_bits(&self, bits: u128) -> IpAddr {
        match self.address {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(bits as u32)),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(bits)),
        }
    }
}

impl fmt::Display for IpNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for IpNet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidIpPrefix(s.to_string()))?;

        let address: IpAddr = addr_str
            .parse()
            .map_err(|_| ParseError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;

        IpNet::new(address, prefix_len)
    }
}

/// Derives a prefix length from a netmask string by counting one-bits
/// (e.g. `255.255.0.0` yields 16).
///
/// # Errors
///
/// Returns an error if the netmask is not a valid IP address.
pub fn netmask_prefix_len(mask: &str) -> Result<u8, ParseError> {
    let addr: IpAddr = mask
        .parse()
        .map_err(|_| ParseError::InvalidNetmask(mask.to_string()))?;

    Ok(match addr {
        IpAddr::V4(v4) => u32::from(v4).count_ones() as u8,
        IpAddr::V6(v6) => u128::from(v6).count_ones() as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_display() {
        let net: IpNet = "10.0.0.1/24".parse().unwrap();
        assert_eq!(net.prefix_len(), 24);
        assert_eq!(net.to_string(), "10.0.0.1/24");

        let net: IpNet = "2001:db8::1/64".parse().unwrap();
        assert!(net.is_ipv6());
        assert_eq!(net.to_string(), "2001:db8::1/64");
    }

    #[test]
    fn test_parse_rejects_bare_address() {
        assert!("10.0.0.1".parse::<IpNet>().is_err());
        assert!("10.0.0.1/33".parse::<IpNet>().is_err());
        assert!("2001:db8::/129".parse::<IpNet>().is_err());
    }

    #[test]
    fn test_network_masks_host_bits() {
        let net: IpNet = "172.16.1.1/16".parse().unwrap();
        assert_eq!(net.network().to_string(), "172.16.0.0/16");

        let net: IpNet = "172.18.1.1/24".parse().unwrap();
        assert_eq!(net.network().to_string(), "172.18.1.0/24");

        let net: IpNet = "10.0.1.1/32".parse().unwrap();
        assert_eq!(net.network().to_string(), "10.0.1.1/32");

        let net: IpNet = "2001:db8:1:0:dead::beef/64".parse().unwrap();
        assert_eq!(net.network().to_string(), "2001:db8:1::/64");
    }

    #[test]
    fn test_block_bounds() {
        let net: IpNet = "192.168.1.0/24".parse().unwrap();
        assert_eq!(net.last() - net.first(), 255);
        assert_eq!(net.addr_from_bits(net.first() + 2).to_string(), "192.168.1.2");
        assert_eq!(net.addr_from_bits(net.last() - 1).to_string(), "192.168.1.254");
    }

    #[test]
    fn test_netmask_prefix_len() {
        assert_eq!(netmask_prefix_len("255.255.255.0").unwrap(), 24);
        assert_eq!(netmask_prefix_len("255.255.0.0").unwrap(), 16);
        assert_eq!(netmask_prefix_len("255.255.255.255").unwrap(), 32);
        assert_eq!(netmask_prefix_len("0.0.0.0").unwrap(), 0);
        assert!(netmask_prefix_len("garbage").is_err());
    }
}
