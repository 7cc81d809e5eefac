// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the confidential-computation gateway (relayer).
//!
//! The gateway turns clear amounts into ciphertext handles plus an input
//! proof that the token contract accepts, and re-encrypts handles for their
//! owner. Handles are opaque to the SDK: they are only passed through.

use std::str::FromStr;

use alloy::{
    primitives::{Address, Bytes, B256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// Encrypted input ready to pass to a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: B256,
    pub input_proof: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed gateway response: {0}")]
    Malformed(String),

    #[error("signing decryption request failed: {0}")]
    Signing(String),
}

impl From<GatewayError> for SdkError {
    fn from(e: GatewayError) -> Self {
        SdkError::Network(e.to_string())
    }
}

/// Encryption/decryption collaborator.
#[allow(async_fn_in_trait)]
pub trait ConfidentialGateway {
    /// Encrypt `value` for use by `user` in calls to `contract`.
    async fn encrypt_u64(
        &self,
        contract: Address,
        user: Address,
        value: u64,
    ) -> Result<EncryptedInput, GatewayError>;

    /// Decrypt a handle the signer is allowed to read.
    async fn decrypt_u64(
        &self,
        contract: Address,
        handle: B256,
        owner: &PrivateKeySigner,
    ) -> Result<u64, GatewayError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InputProofRequest {
    contract_address: String,
    user_address: String,
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputProofResponse {
    handles: Vec<String>,
    input_proof: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserDecryptRequest {
    handle: String,
    contract_address: String,
    user_address: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct UserDecryptResponse {
    value: String,
}

/// HTTP JSON gateway client.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: url::Url,
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, SdkError> {
        let base_url = base_url.parse().map_err(|e: url::ParseError| {
            SdkError::validation(format!("invalid gateway URL `{base_url}`: {e}"))
        })?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, GatewayError> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::Malformed(format!("bad endpoint {path}: {e}")))
    }

    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, GatewayError> {
        let response = self.http.post(self.endpoint(path)?).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

impl ConfidentialGateway for HttpGateway {
    async fn encrypt_u64(
        &self,
        contract: Address,
        user: Address,
        value: u64,
    ) -> Result<EncryptedInput, GatewayError> {
        let request = InputProofRequest {
            contract_address: contract.to_checksum(None),
            user_address: user.to_checksum(None),
            values: vec![value.to_string()],
        };
        let response: InputProofResponse = self.post("v1/input-proof", &request).await?;
        parse_input_proof(response)
    }

    async fn decrypt_u64(
        &self,
        contract: Address,
        handle: B256,
        owner: &PrivateKeySigner,
    ) -> Result<u64, GatewayError> {
        let signature = owner
            .sign_message_sync(handle.as_slice())
            .map_err(|e| GatewayError::Signing(e.to_string()))?;
        let request = UserDecryptRequest {
            handle: handle.to_string(),
            contract_address: contract.to_checksum(None),
            user_address: owner.address().to_checksum(None),
            signature: alloy::hex::encode_prefixed(signature.as_bytes()),
        };
        let response: UserDecryptResponse = self.post("v1/user-decrypt", &request).await?;
        response
            .value
            .trim()
            .parse()
            .map_err(|e| GatewayError::Malformed(format!("value `{}`: {e}", response.value)))
    }
}

fn parse_input_proof(response: InputProofResponse) -> Result<EncryptedInput, GatewayError> {
    let [handle] = response.handles.as_slice() else {
        return Err(GatewayError::Malformed(format!(
            "expected one handle, got {}",
            response.handles.len()
        )));
    };
    let handle = B256::from_str(handle)
        .map_err(|e| GatewayError::Malformed(format!("handle `{handle}`: {e}")))?;
    let input_proof = Bytes::from_str(&response.input_proof)
        .map_err(|e| GatewayError::Malformed(format!("input proof: {e}")))?;
    Ok(EncryptedInput {
        handle,
        input_proof,
    })
}
