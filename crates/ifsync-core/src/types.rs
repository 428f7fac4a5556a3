//! Address value types shared across the crate
//!
//! Interface configuration is expressed in terms of CIDR prefixes and 6-byte
//! hardware addresses. Both types parse from and display as the conventional
//! text forms and serialize as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::Error;

/// An interface address with its prefix length (e.g. `192.168.1.10/24`,
/// `2001:db8::1/64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpPrefix {
    address: IpAddr,
    prefix_len: u8,
}

impl IpPrefix {
    /// Create a new prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length exceeds the maximum for the
    /// address family (32 for IPv4, 128 for IPv6).
    pub fn new(address: IpAddr, prefix_len: u8) -> Result<Self, Error> {
        let max_len: u8 = if address.is_ipv4() { 32 } else { 128 };
        if prefix_len > max_len {
            return Err(Error::invalid_input(format!(
                "prefix length {} exceeds maximum {} for this address family",
                prefix_len, max_len
            )));
        }
        Ok(Self {
            address,
            prefix_len,
        })
    }

    /// The bare address without the prefix length.
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// The prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// True for IPv4 prefixes.
    pub const fn is_ipv4(&self) -> bool {
        self.address.is_ipv4()
    }

    /// True for IPv6 prefixes.
    pub const fn is_ipv6(&self) -> bool {
        self.address.is_ipv6()
    }

    /// True when both prefixes belong to the same address family.
    pub const fn same_family(&self, other: &IpPrefix) -> bool {
        self.is_ipv4() == other.is_ipv4()
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for IpPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .rsplit_once('/')
            .ok_or_else(|| Error::invalid_input(format!("not a CIDR prefix: {}", s)))?;

        let address: IpAddr = addr_str
            .parse()
            .map_err(|_| Error::invalid_input(format!("invalid address: {}", addr_str)))?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| Error::invalid_input(format!("invalid prefix length: {}", len_str)))?;

        IpPrefix::new(address, prefix_len)
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpPrefix> for String {
    fn from(prefix: IpPrefix) -> Self {
        prefix.to_string()
    }
}

/// A 48-bit hardware (MAC) address.
///
/// Parses from colon- or hyphen-separated hex octets and displays as
/// lowercase colon-separated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Create a MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// The raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// True for the all-zero address, which adapters report when no
    /// hardware address is assigned.
    pub const fn is_zero(&self) -> bool {
        self.0[0] == 0
            && self.0[1] == 0
            && self.0[2] == 0
            && self.0[3] == 0
            && self.0[4] == 0
            && self.0[5] == 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains('-') { '-' } else { ':' };
        let mut bytes = [0u8; 6];
        let mut count = 0;

        for part in s.split(separator) {
            if count == 6 {
                return Err(Error::invalid_input(format!("invalid MAC address: {}", s)));
            }
            bytes[count] = u8::from_str_radix(part, 16)
                .map_err(|_| Error::invalid_input(format!("invalid MAC address: {}", s)))?;
            count += 1;
        }

        if count != 6 {
            return Err(Error::invalid_input(format!("invalid MAC address: {}", s)));
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}
