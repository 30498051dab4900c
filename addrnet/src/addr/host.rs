//! # Host
//!
//! A [`Host`] is an opaque byte sequence holding either hostname text or raw IP
//! octets (4 bytes for IPv4, 16 bytes for IPv6).
//!
//! Three literal shorthands are recognised before any IP interpretation:
//!
//! | Text          | `to_string()` | `is_ip()` | `as_ip()`   |
//! |---------------|---------------|-----------|-------------|
//! | `"::"`        | `127.0.0.1`   | `true`    | `127.0.0.1` |
//! | `":"`         | `:`           | `false`   | `0.0.0.0`   |
//! | `"localhost"` | `localhost`   | `false`   | `127.0.0.1` |
//!
//! Everything that is neither a shorthand nor raw IP octets is a hostname and
//! renders verbatim. [`Host::as_ip`] falls back to a best-effort DNS lookup for
//! those.
//!
//! ```rust
//! use addrnet::Host;
//! use std::net::{IpAddr, Ipv4Addr};
//!
//! let host = Host::from(Ipv4Addr::new(10, 0, 0, 1));
//! assert_eq!(host.to_string(), "10.0.0.1");
//! assert!(host.is_ip());
//!
//! let any = Host::from(":");
//! assert_eq!(any.to_string(), ":");
//! assert!(!any.is_ip());
//! assert_eq!(any.as_ip(), Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)));
//! ```
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    borrow::Cow,
    fmt::{Debug, Display},
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs},
};

/// Hostname text or raw IP octets.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Host(Vec<u8>);

impl Host {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Host {
        Host(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this host is an IP literal.
    ///
    /// `"::"` counts as one, `":"` and `"localhost"` do not even though
    /// [`Host::as_ip`] resolves them.
    pub fn is_ip(&self) -> bool {
        let (ip, shorthand) = self.interpret();
        self.0 == b"::" || (ip.is_some() && !shorthand)
    }

    /// Returns the IP this host stands for.
    ///
    /// Shorthands and raw octets are answered directly. Hostnames go through a
    /// blocking system lookup and the last resolved address is returned in its
    /// IPv4 form; `None` if the lookup fails or the last address has no IPv4 form.
    pub fn as_ip(&self) -> Option<IpAddr> {
        if let (Some(ip), _) = self.interpret() {
            return Some(ip);
        }
        if self.is_empty() {
            return None;
        }

        let name = self.text();
        match (&*name, 0).to_socket_addrs() {
            Ok(addrs) => last_as_ipv4(addrs),
            Err(err) => {
                tracing::debug!(host = %name, error = %err, "host lookup failed");
                None
            }
        }
    }

    /// Interprets the bytes as an IP. The flag is set when a literal shorthand
    /// produced the result rather than the octets themselves.
    fn interpret(&self) -> (Option<IpAddr>, bool) {
        match self.0.as_slice() {
            b"::" | b"localhost" => (Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), true),
            b":" => (Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), true),
            octets => (ip_from_octets(octets), false),
        }
    }

    fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "tokio-dep")] {
        impl Host {
            /// Async flavour of [`Host::as_ip`] using the tokio resolver.
            ///
            /// There is no internal timeout; wrap the future in
            /// [`tokio::time::timeout`] to bound it.
            pub async fn as_ip_async(&self) -> Option<IpAddr> {
                if let (Some(ip), _) = self.interpret() {
                    return Some(ip);
                }
                if self.is_empty() {
                    return None;
                }

                let name = self.text();
                match tokio::net::lookup_host((&*name, 0)).await {
                    Ok(addrs) => last_as_ipv4(addrs),
                    Err(err) => {
                        tracing::debug!(host = %name, error = %err, "host lookup failed");
                        None
                    }
                }
            }
        }
    }
}

fn ip_from_octets(octets: &[u8]) -> Option<IpAddr> {
    if let Ok(v4) = <[u8; 4]>::try_from(octets) {
        return Some(IpAddr::V4(Ipv4Addr::from(v4)));
    }
    let v6 = Ipv6Addr::from(<[u8; 16]>::try_from(octets).ok()?);
    match v6.to_ipv4_mapped() {
        Some(v4) => Some(IpAddr::V4(v4)),
        None => Some(IpAddr::V6(v6)),
    }
}

fn last_as_ipv4(addrs: impl Iterator<Item = SocketAddr>) -> Option<IpAddr> {
    match addrs.last()?.ip() {
        IpAddr::V4(v4) => Some(IpAddr::V4(v4)),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4),
    }
}

impl Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.interpret() {
            (Some(ip), shorthand) if !shorthand || self.0 == b"::" => write!(f, "{ip}"),
            _ => f.write_str(&self.text()),
        }
    }
}

impl Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Host").field(&self.text()).finish()
    }
}

impl From<&str> for Host {
    fn from(value: &str) -> Self {
        Host(value.as_bytes().to_vec())
    }
}

impl From<String> for Host {
    fn from(value: String) -> Self {
        Host(value.into_bytes())
    }
}

impl From<&[u8]> for Host {
    fn from(value: &[u8]) -> Self {
        Host(value.to_vec())
    }
}

impl From<Vec<u8>> for Host {
    fn from(value: Vec<u8>) -> Self {
        Host(value)
    }
}

impl From<Ipv4Addr> for Host {
    fn from(value: Ipv4Addr) -> Self {
        Host(value.octets().to_vec())
    }
}

impl From<Ipv6Addr> for Host {
    fn from(value: Ipv6Addr) -> Self {
        Host(value.octets().to_vec())
    }
}

impl From<IpAddr> for Host {
    fn from(value: IpAddr) -> Self {
        match value {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl Serialize for Host {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Host {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Host::from)
    }
}
