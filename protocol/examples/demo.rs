//! Step-by-step walkthrough of the remote-auth handshake.
//!
//! Plays both roles in one process: the initiator is a real
//! `HandshakeSession`, the authority is a few lines of inline code that
//! encrypts to the initiator's key and checks its proof. No network.
//!
//! Run with:
//!   cargo run --example demo --release

use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde_json::json;

use ra_protocol::codec::derive_proof;
use ra_protocol::crypto::encrypt_to_spki;
use ra_protocol::handshake::{HandshakeSession, OutboundMessage, SideEffect, Transition};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn section(num: u32, title: &str) {
    println!();
    let rule = "=".repeat(40);
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]{rule}{RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
}

fn wire(direction: &str, frame: &str) {
    let shown = if frame.chars().count() > 72 {
        format!("{}...", frame.chars().take(72).collect::<String>())
    } else {
        frame.to_string()
    };
    println!("{DIM}{MAGENTA}  {direction} {shown}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

/// Feed one authority frame to the session, echoing both directions.
fn deliver(session: &mut HandshakeSession, frame: serde_json::Value) -> Transition {
    let text = frame.to_string();
    wire("<-", &text);
    let transition = session.handle_frame(&text).expect("handshake step");
    if let Some(outbound) = &transition.outbound {
        wire("->", &outbound.encode().expect("encode"));
    }
    transition
}

fn main() {
    let start = Instant::now();

    section(1, "Session keypair");
    let t = Instant::now();
    let mut session = HandshakeSession::new().expect("keygen");
    info("session", &session.session_id().to_string());
    info("keygen", &format!("{:.1} ms", t.elapsed().as_secs_f64() * 1000.0));

    section(2, "hello -> init");
    let transition = deliver(&mut session, json!({"op": "hello", "heartbeat_interval": 41250}));
    let spki = match transition.outbound {
        Some(OutboundMessage::Init { encoded_public_key }) => {
            STANDARD.decode(encoded_public_key).expect("base64 spki")
        }
        other => panic!("expected init, got {:?}", other),
    };
    success(&format!("public key sent ({} bytes SPKI DER)", spki.len()));

    section(3, "nonce_proof -> nonce_proof");
    let mut nonce = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    let encrypted_nonce = STANDARD.encode(encrypt_to_spki(&spki, &nonce).expect("encrypt"));
    let transition = deliver(
        &mut session,
        json!({"op": "nonce_proof", "encrypted_nonce": encrypted_nonce}),
    );
    match transition.outbound {
        Some(OutboundMessage::NonceProof { proof }) if proof == derive_proof(&nonce) => {
            success("authority accepted the proof");
        }
        other => panic!("bad proof: {:?}", other),
    }

    section(4, "pending_remote_init -> visual code");
    let transition = deliver(
        &mut session,
        json!({"op": "pending_remote_init", "fingerprint": "demo-fingerprint"}),
    );
    if let Some(SideEffect::RenderCode { url }) = transition.effect {
        info("scan", &url);
    }

    section(5, "pending_ticket -> identity");
    let ticket = STANDARD.encode(
        encrypt_to_spki(&spki, b"123456789:0001:av_hash:alice").expect("encrypt"),
    );
    let transition = deliver(
        &mut session,
        json!({"op": "pending_ticket", "encrypted_user_payload": ticket}),
    );
    if let Some(SideEffect::IdentityReceived(identity)) = transition.effect {
        info("user", &identity.to_string());
        info("avatar", &identity.avatar);
    }

    section(6, "pending_login -> done");
    deliver(&mut session, json!({"op": "pending_login", "ticket": "demo"}));
    success(&format!("session {}", session.state()));

    println!();
    println!(
        "{DIM}  total {:.1} ms{RESET}",
        start.elapsed().as_secs_f64() * 1000.0
    );
}
