// Key material and codec benchmarks for the remote-auth handshake.
//
// Covers RSA-2048 session key generation, OAEP decryption of a nonce-sized
// ciphertext, proof derivation, and the full hello -> nonce_proof exchange
// through the state machine.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use criterion::{criterion_group, criterion_main, Criterion};

use ra_protocol::codec::{derive_proof, parse_user_identity};
use ra_protocol::crypto::{encrypt_to_spki, SessionKeys};
use ra_protocol::handshake::{HandshakeSession, InboundMessage};

fn bench_key_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rsa");
    group.sample_size(10);
    group.bench_function("keypair_generate_2048", |b| {
        b.iter(|| SessionKeys::generate().unwrap());
    });
    group.finish();
}

fn bench_decrypt_nonce(c: &mut Criterion) {
    let keys = SessionKeys::generate().unwrap();
    let spki = keys.export_public_key().unwrap();
    let ciphertext = encrypt_to_spki(&spki, &[7u8; 32]).unwrap();

    c.bench_function("rsa/oaep_sha256_decrypt", |b| {
        b.iter(|| keys.decrypt(&ciphertext).unwrap());
    });
}

fn bench_codec(c: &mut Criterion) {
    let nonce = [0x42u8; 32];
    c.bench_function("codec/derive_proof", |b| {
        b.iter(|| derive_proof(&nonce));
    });

    let ticket = b"123456789:0001:av_hash:alice";
    c.bench_function("codec/parse_user_identity", |b| {
        b.iter(|| parse_user_identity(ticket).unwrap());
    });
}

fn bench_nonce_exchange(c: &mut Criterion) {
    let mut group = c.benchmark_group("handshake");
    group.sample_size(10);
    group.bench_function("hello_then_nonce_proof", |b| {
        b.iter(|| {
            let mut session = HandshakeSession::new().unwrap();
            session.handle_frame(r#"{"op":"hello"}"#).unwrap();

            let spki = session.public_key_der().unwrap();
            let encrypted_nonce = STANDARD.encode(encrypt_to_spki(&spki, b"nonce").unwrap());
            session
                .handle(InboundMessage::NonceProof { encrypted_nonce })
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_decrypt_nonce,
    bench_codec,
    bench_nonce_exchange,
);
criterion_main!(benches);
