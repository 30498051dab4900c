//! # Proto
//!
//! Protocol identifiers for [`Addr`](super::Addr) values.
//!
//! A [`Proto`] covers both raw transports (`tcp`, `udp`) and application-layer
//! schemes (`http`, `https`, `k8spf`). Parsing is total: anything unrecognised
//! becomes [`Proto::Unknown`], which is itself treated as a scheme.
//!
//! ```rust
//! use addrnet::Proto;
//!
//! assert_eq!(Proto::parse(" TCP "), Proto::Tcp);
//! assert_eq!(Proto::parse("bogus"), Proto::Unknown);
//! assert_eq!(Proto::Udp.iana_number(), 17);
//! assert!(Proto::Https.is_scheme());
//! ```
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::Infallible, fmt::Display, str::FromStr};

/// Encompasses both network protocols and schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Proto {
    #[default]
    Unknown = 0,
    Tcp,
    Udp,
    Http,
    Https,
    K8spf,
}

impl Proto {
    /// IANA number reported for anything that isn't a raw transport.
    pub const IANA_NOT_APPLICABLE: u8 = 255;

    /// Parses a protocol name. Case and surrounding whitespace are ignored,
    /// unrecognised input yields [`Proto::Unknown`].
    pub fn parse(s: &str) -> Proto {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Proto::Udp,
            "tcp" => Proto::Tcp,
            "http" => Proto::Http,
            "https" => Proto::Https,
            "k8spf" => Proto::K8spf,
            _ => Proto::Unknown,
        }
    }

    /// Returns `false` only for the raw transports (`tcp`, `udp`).
    pub fn is_scheme(self) -> bool {
        !matches!(self, Proto::Tcp | Proto::Udp)
    }

    /// The protocol number assigned by IANA
    /// (<https://www.iana.org/assignments/protocol-numbers/protocol-numbers.xhtml>).
    ///
    /// [`Proto::IANA_NOT_APPLICABLE`] is returned for everything but TCP and UDP.
    pub fn iana_number(self) -> u8 {
        match self {
            Proto::Tcp => 6,
            Proto::Udp => 17,
            _ => Self::IANA_NOT_APPLICABLE,
        }
    }

    /// Canonical lowercase name, empty for [`Proto::Unknown`].
    pub fn as_str(self) -> &'static str {
        match self {
            Proto::Unknown => "",
            Proto::Tcp => "tcp",
            Proto::Udp => "udp",
            Proto::Http => "http",
            Proto::Https => "https",
            Proto::K8spf => "k8spf",
        }
    }
}

impl Display for Proto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Proto {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Proto::parse(s))
    }
}

impl From<&str> for Proto {
    fn from(value: &str) -> Self {
        Proto::parse(value)
    }
}

impl Serialize for Proto {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Proto {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Proto::parse(&s))
    }
}
