// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Remote-Auth Client
//!
//! Entry point for the `ra-client` binary. Parses CLI arguments, initializes
//! logging, and runs one QR login handshake against the authority gateway.
//!
//! The binary supports two subcommands:
//!
//! - `login`: show a QR code and wait for another device to approve it
//! - `version`: print build version information

mod cli;
mod logging;
mod render;
mod ws;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;

use ra_protocol::handshake::{run_handshake, HandshakeOutcome, HandshakeSession};

use cli::{Commands, LoginArgs, RaClientCli};
use render::QrRenderer;
use ws::WsTransport;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = RaClientCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Login(args) => login(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs a single handshake and prints the approving account.
async fn login(args: LoginArgs) -> Result<()> {
    let authority = args.authority();

    // RSA key generation blocks for a noticeable moment.
    let domain = authority.domain.clone();
    let mut session = tokio::task::spawn_blocking(move || HandshakeSession::with_domain(domain))
        .await
        .context("key generation task failed")?
        .context("failed to generate session keypair")?;
    tracing::info!(session = %session.session_id(), "session keypair ready");

    let mut transport = WsTransport::connect(&authority)
        .await
        .with_context(|| format!("failed to connect to {}", authority.gateway_url))?;
    let mut renderer = QrRenderer::stdout(args.qr_output.clone());

    let outcome = tokio::select! {
        res = run_handshake(&mut session, &mut transport, &mut renderer) => {
            res.context("remote-auth handshake failed")?
        }
        _ = shutdown_signal() => {
            session.abandon();
            bail!("interrupted before the login was approved");
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &HandshakeOutcome) {
    let identity = &outcome.identity;
    println!();
    println!("Login approved.");
    println!("  User ID  : {}", identity.id);
    println!("  Username : {}", identity.username);
    println!("  Tag      : {}", identity.discriminator);
    println!("  Avatar   : {}", identity.avatar);
}

/// Prints version information to stdout.
fn print_version() {
    println!("ra-client {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  v{}", ra_protocol::config::PROTOCOL_VERSION);
}

/// Waits for Ctrl+C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::warn!("failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
