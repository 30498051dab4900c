//! Inspects addresses: prints how each one splits, formats and (optionally)
//! resolves, one JSON object per line.
//!
//! ```text
//! addrnet-cli [--resolve] [ADDR...]
//! ```
//!
//! With no addresses on the command line they are read from stdin, one per line.
use addrnet::{
    Addr,
    config::{ConfigLoader, List, Log, logger::new_logger},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{io::BufRead, process::ExitCode, time::Duration};

const APP_NAME: &str = "addrnet";

#[derive(Debug, Parser)]
#[command(name = "addrnet-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Resolve each host to an IP, bounded by `resolve.timeout` from config.
    #[arg(long)]
    resolve: bool,

    /// Addresses to inspect. Read from stdin, one per line, when empty.
    addrs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct CliConfig {
    log: Log,
    resolve: Resolve,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct Resolve {
    /// Milliseconds.
    timeout: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log: Log {
                level: "info".to_string(),
                outputs: List::from("stderr"),
            },
            resolve: Resolve::default(),
        }
    }
}

impl Default for Resolve {
    fn default() -> Self {
        Self { timeout: 2000 }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    input: String,
    proto: String,
    host: String,
    port: u16,
    is_ip: bool,
    is_socket: bool,
    network: &'static str,
    display: String,
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli {
        resolve,
        addrs: mut inputs,
    } = Cli::parse();

    let config: CliConfig = match ConfigLoader::new(APP_NAME)
        .load(Some(&CliConfig::default()))
        .and_then(|layered| layered.unmarshal())
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let dispatch = match new_logger(&config.log) {
        Ok(dispatch) => dispatch,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = tracing::dispatcher::set_global_default(dispatch) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    if inputs.is_empty() {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if !line.trim().is_empty() => inputs.push(line.trim().to_string()),
                Ok(_) => {}
                Err(e) => {
                    eprintln!("{e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    let timeout = Duration::from_millis(config.resolve.timeout);
    tracing::debug!(count = inputs.len(), resolve, "inspecting addresses");

    for input in inputs {
        let report = inspect(input, resolve.then_some(timeout)).await;
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

async fn inspect(input: String, resolve: Option<Duration>) -> Report {
    let addr = Addr::from(input.as_str());
    let (proto, host, port) = addr.split();

    let ip = match resolve {
        Some(timeout) => match tokio::time::timeout(timeout, host.as_ip_async()).await {
            Ok(ip) => ip.map(|ip| ip.to_string()),
            Err(_) => {
                tracing::warn!(%host, ?timeout, "resolution timed out");
                None
            }
        },
        None => None,
    };

    Report {
        proto: proto.to_string(),
        host: host.to_string(),
        port,
        is_ip: host.is_ip(),
        is_socket: addr.is_socket(),
        network: addr.network(),
        display: addr.to_string(),
        key: addr.key().to_string(),
        ip,
        input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_flags_and_addrs() {
        let cli = Cli::try_parse_from(["addrnet-cli", "--resolve", "tcp://a:1", "::53"]).unwrap();
        assert!(cli.resolve);
        assert_eq!(cli.addrs, vec!["tcp://a:1", "::53"]);

        let cli = Cli::try_parse_from(["addrnet-cli"]).unwrap();
        assert!(!cli.resolve);
        assert!(cli.addrs.is_empty());
    }

    #[test]
    fn test_cli_rejects_unknown_flags() {
        let err = Cli::try_parse_from(["addrnet-cli", "--resolv", "a:1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        let err = Cli::try_parse_from(["addrnet-cli", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[tokio::test]
    async fn test_cli_inspect_without_resolution() {
        let report = inspect("udp://::53".to_string(), None).await;
        assert_eq!(report.proto, "udp");
        assert_eq!(report.host, "localhost");
        assert_eq!(report.port, 53);
        assert_eq!(report.network, "udp");
        assert_eq!(report.display, "localhost:53");
        assert_eq!(report.key, "udp://::53");
        assert!(report.ip.is_none());
    }

    #[tokio::test]
    async fn test_cli_inspect_resolves_shorthand() {
        let report = inspect("tcp://:8080".to_string(), Some(Duration::from_secs(1))).await;
        assert_eq!(report.host, ":");
        assert!(!report.is_ip);
        assert_eq!(report.ip.as_deref(), Some("0.0.0.0"));
    }
}
