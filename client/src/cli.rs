//! # CLI Interface
//!
//! Defines the command-line argument structure for `ra-client` using
//! `clap` derive. Two subcommands: `login` and `version`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ra_protocol::config::{
    AuthorityConfig, DEFAULT_AUTHORITY_DOMAIN, DEFAULT_GATEWAY_URL, DEFAULT_ORIGIN,
};

use crate::logging::LogFormat;

/// Remote-auth QR login initiator.
///
/// Connects to the authority's gateway, shows a QR code, and waits for an
/// already logged-in device to scan and approve it.
#[derive(Parser, Debug)]
#[command(
    name = "ra-client",
    about = "Remote-auth QR login initiator",
    version,
    propagate_version = true
)]
pub struct RaClientCli {
    /// Log output format.
    #[arg(long, global = true, value_enum, env = "RA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(
        long,
        global = true,
        env = "RA_LOG_LEVEL",
        default_value = "ra_client=info,ra_protocol=info"
    )]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one handshake and print the approving account.
    Login(LoginArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `login` subcommand.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// WebSocket URL of the remote-auth gateway.
    #[arg(long, env = "RA_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// `Origin` header sent when connecting. Must match the authority's web
    /// origin or the gateway hangs up.
    #[arg(long, env = "RA_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// Domain used in the scannable URL.
    #[arg(long, env = "RA_DOMAIN", default_value = DEFAULT_AUTHORITY_DOMAIN)]
    pub domain: String,

    /// Also write the QR code as an SVG file.
    #[arg(long, env = "RA_QR_OUTPUT")]
    pub qr_output: Option<PathBuf>,

    /// Print the final outcome as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl LoginArgs {
    /// The endpoint part of the arguments.
    pub fn authority(&self) -> AuthorityConfig {
        AuthorityConfig {
            gateway_url: self.gateway_url.clone(),
            origin: self.origin.clone(),
            domain: self.domain.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        RaClientCli::command().debug_assert();
    }

    #[test]
    fn login_defaults_match_authority_config() {
        let cli = RaClientCli::try_parse_from(["ra-client", "login"]).unwrap();
        match cli.command {
            Commands::Login(args) => {
                assert_eq!(args.authority(), AuthorityConfig::default());
                assert!(args.qr_output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn login_overrides() {
        let cli = RaClientCli::try_parse_from([
            "ra-client",
            "--log-format",
            "json",
            "login",
            "--gateway-url",
            "ws://127.0.0.1:9000",
            "--domain",
            "localhost",
            "--qr-output",
            "code.svg",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::Login(args) => {
                let authority = args.authority();
                assert_eq!(authority.gateway_url, "ws://127.0.0.1:9000");
                assert_eq!(authority.domain, "localhost");
                assert_eq!(authority.origin, DEFAULT_ORIGIN);
                assert_eq!(args.qr_output, Some(PathBuf::from("code.svg")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
