// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `WalletSpec`: how a command names the wallet it wants.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::error::{SdkError, SdkResult};

/// A wallet reference, resolved by [`super::WalletResolver`] (or, for
/// `AutoOwnerOf`, by [`crate::chain_config::ChainConfig::signing_wallet`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletSpec {
    /// Position in the derivation sequence. Signed so that a negative index
    /// is reported as out of range instead of as a parse error.
    Index(i64),
    /// Registered alias, normalized to lowercase.
    Alias(String),
    Address(Address),
    /// Raw private key in hex.
    PrivateKey(String),
    /// PEM key file.
    KeyFile(PathBuf),
    /// Whoever `owner()` of the contract returns.
    AutoOwnerOf(Address),
}

impl WalletSpec {
    /// Parse CLI text, resolving a bare `auto` against `auto_target`.
    pub fn parse_with_auto(raw: &str, auto_target: Option<Address>) -> SdkResult<Self> {
        if raw.trim().eq_ignore_ascii_case("auto") {
            return auto_target.map(WalletSpec::AutoOwnerOf).ok_or_else(|| {
                SdkError::validation("`auto` has no contract to take the owner of in this command")
            });
        }
        raw.parse()
    }

    pub fn alias(name: &str) -> Self {
        WalletSpec::Alias(name.trim().to_lowercase())
    }
}

impl FromStr for WalletSpec {
    type Err = SdkError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(SdkError::validation("empty wallet reference"));
        }

        if let Some(target) = strip_prefix_ci(s, "auto:") {
            let contract = Address::from_str(target.trim()).map_err(|e| {
                SdkError::validation(format!("`auto:` needs a contract address: {e}"))
            })?;
            return Ok(WalletSpec::AutoOwnerOf(contract));
        }

        if let Some(path) = strip_prefix_ci(s, "keyfile:") {
            return Ok(WalletSpec::KeyFile(PathBuf::from(path)));
        }

        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(SdkError::InvalidKey(format!(
                    "`{s}` is neither an address nor a private key"
                )));
            }
            return match hex.len() {
                40 => Address::from_str(s)
                    .map(WalletSpec::Address)
                    .map_err(|e| SdkError::validation(format!("invalid address `{s}`: {e}"))),
                64 => Ok(WalletSpec::PrivateKey(s.to_string())),
                n => Err(SdkError::InvalidKey(format!(
                    "`{s}` has {n} hex digits; addresses have 40, private keys 64"
                ))),
            };
        }

        if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(WalletSpec::PrivateKey(s.to_string()));
        }

        let digits = s.strip_prefix('-').unwrap_or(s);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            // Anything too large for i64 is out of range anyway.
            let index = s.parse::<i64>().unwrap_or(i64::MAX);
            return Ok(WalletSpec::Index(index));
        }

        Ok(WalletSpec::alias(s))
    }
}

impl fmt::Display for WalletSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletSpec::Index(i) => write!(f, "#{i}"),
            WalletSpec::Alias(name) => write!(f, "{name}"),
            WalletSpec::Address(address) => write!(f, "{address}"),
            WalletSpec::PrivateKey(_) => write!(f, "<private key>"),
            WalletSpec::KeyFile(path) => write!(f, "keyfile:{}", path.display()),
            WalletSpec::AutoOwnerOf(contract) => write!(f, "auto:{contract}"),
        }
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
