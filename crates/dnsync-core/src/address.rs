//! Public address value type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::Error;

/// The caller's externally visible address, as published in "A" records
///
/// Always a syntactically valid IPv4 address; equality is value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(Ipv4Addr);

impl Address {
    /// Wrap an IPv4 address
    pub const fn new(ip: Ipv4Addr) -> Self {
        Self(ip)
    }

    /// The underlying IPv4 address
    pub const fn ip(&self) -> Ipv4Addr {
        self.0
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("address cannot be empty"));
        }

        trimmed
            .parse::<Ipv4Addr>()
            .map(Self)
            .map_err(|_| Error::invalid_input(format!("not an IPv4 address: '{}'", trimmed)))
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
