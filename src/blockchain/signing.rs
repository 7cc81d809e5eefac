// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Private key parsing.
//!
//! Keys arrive either as raw hex on the command line or as PEM key files
//! (PKCS#8 or SEC1), and are turned into alloy local signers.

use std::path::Path;

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

use crate::error::{SdkError, SdkResult};

/// Create a signer from a hex private key (64 hex digits, `0x` optional).
pub fn signer_from_hex(raw: &str) -> SdkResult<PrivateKeySigner> {
    let digits = raw.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);

    if digits.len() != 64 {
        return Err(SdkError::InvalidKey(format!(
            "expected 64 hex digits, got {}",
            digits.len()
        )));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SdkError::InvalidKey("key contains non-hex characters".into()));
    }

    let key_bytes =
        alloy::hex::decode(digits).map_err(|e| SdkError::InvalidKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| SdkError::InvalidKey(format!("not a valid secp256k1 scalar: {e}")))
}

/// Parse a PEM-encoded private key to its raw 32 bytes.
pub fn pem_to_key_bytes(pem_bytes: &[u8]) -> SdkResult<[u8; 32]> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SdkError::InvalidKey(format!("Invalid UTF-8: {e}")))?;

    let pem = pem::parse(pem_str).map_err(|e| SdkError::InvalidKey(format!("Invalid PEM: {e}")))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| {
            use k256::pkcs8::DecodePrivateKey;
            SecretKey::from_pkcs8_der(pem.contents())
        })
        .map_err(|e| SdkError::InvalidKey(format!("Invalid key format: {e}")))?;

    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&secret_key.to_bytes());
    Ok(key_bytes)
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> SdkResult<PrivateKeySigner> {
    let key_bytes = pem_to_key_bytes(pem_bytes)?;
    PrivateKeySigner::from_slice(&key_bytes).map_err(|e| SdkError::InvalidKey(e.to_string()))
}

/// Create a signer from a PEM key file.
pub fn signer_from_key_file(path: &Path) -> SdkResult<PrivateKeySigner> {
    let bytes = std::fs::read(path)
        .map_err(|e| SdkError::InvalidKey(format!("cannot read {}: {e}", path.display())))?;
    signer_from_pem(&bytes)
}
