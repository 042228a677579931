// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook signature verification.
//!
//! HMAC-SHA256 over the raw request body, compared in constant time against
//! the provider's hex signature. GitHub prefixes the hex with `sha256=`;
//! Plane sends bare hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex HMAC-SHA256 of a body. Used by tests and documented for
/// webhook senders.
pub fn sign_sha256_hex(secret: &str, body: &[u8]) -> String {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(body);
            hex_encode(&mac.finalize().into_bytes())
        }
        // new_from_slice accepts any key length for HMAC; unreachable in
        // practice, and an empty signature verifies nothing.
        Err(_) => String::new(),
    }
}

/// Verify a bare-hex signature (Plane style) in constant time.
pub fn verify_sha256_hex(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let signature = signature_hex.trim().to_lowercase();
    if signature.is_empty() {
        return false;
    }
    let expected = sign_sha256_hex(secret, body);
    if expected.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Verify a GitHub `X-Hub-Signature-256` header value (`sha256=<hex>`).
pub fn verify_github(secret: &str, body: &[u8], header: &str) -> bool {
    match header.strip_prefix("sha256=") {
        Some(hex) => verify_sha256_hex(secret, body, hex),
        None => false,
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
