//! # addrnet
//!
//! A compact network address type for services that pass endpoints around as
//! plain strings, plus the config and logging helpers those services need to
//! read them from files and the environment.
//!
//! ## Features
//!
//! (All feature versions)
//! - **Addr** - `proto://host:port` strings with tolerant parsing and a stable rendering
//! - **Host** - hostname text or raw IP octets, with the `::`, `:` and `localhost` shorthands
//! - **Proto** - the closed set of recognised transports and schemes
//! - **Config** - layered defaults, JSON, YAML and env loading (`config`)
//! - **Logger** - JSON `tracing` logger built from a config section (`config::logger`)
//!
//! ("tokio-dep" feature)
//! - **Async host lookup** - `Host::as_ip_async` on the tokio resolver
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! addrnet = "0.1.0"
//! addrnet = { version = "0.1.0", features = ["tokio-dep"]}
//! ```
//!
//! ## Usage Examples
//!
//! ### Parsing addresses
//!
//! ```rust
//! use addrnet::{Addr, Proto};
//!
//! let addr = Addr::from("udp://10.0.0.5:53");
//! assert_eq!(addr.proto(), Proto::Udp);
//! assert_eq!(addr.host().to_string(), "10.0.0.5");
//! assert_eq!(addr.port(), 53);
//! assert_eq!(addr.network(), "udp");
//!
//! // Without a scheme the proto is unknown and the text is kept as written.
//! let addr = Addr::from("db.local:5432");
//! assert_eq!(addr.proto(), Proto::Unknown);
//! assert_eq!(addr.network(), "");
//! assert_eq!(addr.to_string(), "db.local:5432");
//! ```
//!
//! ### Building addresses
//!
//! ```rust
//! use addrnet::{Addr, Host, Proto};
//! use std::net::Ipv4Addr;
//!
//! let ip = Ipv4Addr::new(192, 168, 0, 10);
//! assert!(Host::from(ip).is_ip());
//!
//! let addr = Addr::new(Proto::Https, ip, 8443);
//! assert_eq!(addr.as_str(), "https://192.168.0.10:8443");
//! // Parsed back out of the string the host is text, not octets.
//! assert_eq!(addr.host(), Host::from("192.168.0.10"));
//! assert!(!addr.host().is_ip());
//! ```
//!
//! ## Architecture
//!
//! - **`addr`** - `Addr`, `Host` and `Proto`
//! - **`config`** - layered loading, `List`/`Map` string types, `Log`/`Server` sections
//! - **`config::logger`** - logger construction
pub mod addr;
pub mod config;

pub use addr::{Addr, Host, Proto};
