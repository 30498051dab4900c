//! # Addresses
//!
//! [`Addr`] is a string-backed description of a reachable endpoint:
//! `proto://host:port`, `host:port`, or an absolute path naming a Unix socket.
//!
//! Nothing is validated up front. An [`Addr`] can wrap any string and every
//! accessor ([`Addr::split`], [`Addr::host`], [`Addr::port`], [`Addr::proto`])
//! re-parses the backing string. Input that can't be decomposed degrades to
//! sentinels instead of failing:
//!
//! - an unrecognised scheme becomes [`Proto::Unknown`] (and is still consumed)
//! - a missing or malformed port becomes `0`
//! - a remainder that can't be split is returned whole as the host
//! - an empty host becomes the `":"` (any address) shorthand
//!
//! ## Building and formatting
//!
//! ```rust
//! use addrnet::{Addr, Proto};
//! use std::net::Ipv4Addr;
//!
//! let addr = Addr::new(Proto::Tcp, Ipv4Addr::LOCALHOST, 8080);
//! assert_eq!(addr.key(), "tcp://127.0.0.1:8080");
//! assert_eq!(addr.to_string(), "127.0.0.1:8080");
//! assert_eq!(addr.network(), "tcp");
//!
//! // Schemes drop a zero port and are displayed as written.
//! let addr = Addr::new(Proto::Https, "localhost", 0);
//! assert_eq!(addr.to_string(), "https://localhost");
//! assert_eq!(addr.network(), "tcp");
//! ```
//!
//! ## Splitting
//!
//! ```rust
//! use addrnet::{Addr, Host, Proto};
//!
//! let (proto, host, port) = Addr::from("tcp://localhost:8080").split();
//! assert_eq!((proto, host, port), (Proto::Tcp, Host::from("localhost"), 8080));
//!
//! // `::` is loopback shorthand, the rest is the port.
//! assert_eq!(Addr::from("::8080").host(), Host::from("localhost"));
//! assert_eq!(Addr::from("::8080").port(), 8080);
//!
//! // An empty host is the "any" address and formats back to empty.
//! assert_eq!(Addr::from(":8080").host(), Host::from(":"));
//! assert_eq!(Addr::from(":8080").to_string(), ":8080");
//! ```
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt::Display, path::Path, str::FromStr};

pub mod host;
pub mod proto;

pub use host::Host;
pub use proto::Proto;

const SCHEME_SEPARATOR: &str = "://";
const LOOPBACK_PREFIX: &str = "::";

/// A network address in `[proto://]host[:port]` form, or an absolute Unix
/// socket path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Addr(String);

impl Addr {
    /// Builds an address from its parts.
    ///
    /// The `proto://` prefix is left out for [`Proto::Unknown`]. The port is
    /// always written for raw transports; schemes only get it when it isn't `0`,
    /// since `0` there means the scheme's default port.
    pub fn new(proto: Proto, host: impl Into<Host>, port: u16) -> Addr {
        let mut addr = String::new();
        if proto != Proto::Unknown {
            addr.push_str(proto.as_str());
            addr.push_str(SCHEME_SEPARATOR);
        }

        addr.push_str(&host.into().to_string());

        if !proto.is_scheme() || port != 0 {
            addr.push(':');
            addr.push_str(&port.to_string());
        }

        Addr(addr)
    }

    pub fn new_tcp(host: impl Into<Host>, port: u16) -> Addr {
        Addr::new(Proto::Tcp, host, port)
    }

    /// Decomposes the address into `(proto, host, port)`.
    ///
    /// Never fails; odd input degrades to sentinels as described in the module docs.
    pub fn split(&self) -> (Proto, Host, u16) {
        let (proto, rest) = match self.0.find(SCHEME_SEPARATOR) {
            Some(idx) => (
                Proto::parse(&self.0[..idx]),
                &self.0[idx + SCHEME_SEPARATOR.len()..],
            ),
            None => (Proto::Unknown, self.0.as_str()),
        };

        if let Some(port) = rest.strip_prefix(LOOPBACK_PREFIX) {
            return (proto, Host::from("localhost"), parse_port(port));
        }

        match split_host_port(rest) {
            Some(("", port)) => (proto, Host::from(":"), parse_port(port)),
            Some((host, port)) => (proto, Host::from(host), parse_port(port)),
            None => (proto, Host::from(rest), 0),
        }
    }

    pub fn host(&self) -> Host {
        self.split().1
    }

    pub fn port(&self) -> u16 {
        self.split().2
    }

    pub fn proto(&self) -> Proto {
        self.split().0
    }

    /// Transport to dial with: schemes carried over TCP report `"tcp"`,
    /// everything else reports its own name.
    pub fn network(&self) -> &'static str {
        match self.proto() {
            Proto::Http | Proto::Https | Proto::K8spf => Proto::Tcp.as_str(),
            proto => proto.as_str(),
        }
    }

    /// Whether the address is an absolute path, i.e. a Unix domain socket.
    pub fn is_socket(&self) -> bool {
        Path::new(&self.0).is_absolute()
    }

    /// The address as written, for use as a map key.
    pub fn key(&self) -> &str {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Splits `host:port` on the last colon. A bracketed host (`[::1]:80`) may
/// contain colons, an unbracketed one may not.
fn split_host_port(hostport: &str) -> Option<(&str, &str)> {
    let colon = hostport.rfind(':')?;

    let (host, host_start, tail_start) = if hostport.starts_with('[') {
        let end = hostport.find(']')?;
        if end + 1 != colon {
            return None;
        }
        (&hostport[1..end], 1, end + 1)
    } else {
        let host = &hostport[..colon];
        if host.contains(':') {
            return None;
        }
        (host, 0, 0)
    };

    if hostport[host_start..].contains('[') || hostport[tail_start..].contains(']') {
        return None;
    }

    Some((host, &hostport[colon + 1..]))
}

/// Anything that isn't a valid `u16` is `0`; out-of-range values are not wrapped.
fn parse_port(port: &str) -> u16 {
    port.parse().unwrap_or(0)
}

/// Dial-ready form.
///
/// Sockets and scheme addresses (including unknown schemes) are returned as
/// written; raw transports are normalised to `host:port`.
impl Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_socket() {
            return f.write_str(&self.0);
        }

        let (proto, host, port) = self.split();
        if proto.is_scheme() {
            return f.write_str(&self.0);
        }

        let host = host.to_string();
        let host = if host == ":" { "" } else { host.as_str() };
        write!(f, "{host}:{port}")
    }
}

impl From<&str> for Addr {
    fn from(value: &str) -> Self {
        Addr(value.to_string())
    }
}

impl From<String> for Addr {
    fn from(value: String) -> Self {
        Addr(value)
    }
}

impl From<Addr> for String {
    fn from(value: Addr) -> Self {
        value.0
    }
}

impl FromStr for Addr {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Addr::from(s))
    }
}

impl AsRef<str> for Addr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
