// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Certificate material and its text-safe encoding.
//!
//! The vault hands back raw certificate bytes; the registration store expects
//! standard Base64 text. [`encode`] and [`decode`] convert between the two.

use base64::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::{RenewalError, Result};

/// Raw certificate bytes as issued by the vault.
///
/// The contents are opaque to the job. `Debug` only prints the length and
/// thumbprint so key material never reaches the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateBytes(Vec<u8>);

impl CertificateBytes {
    /// Wrap raw certificate bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the raw bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256 thumbprint as colon-separated uppercase hex.
    ///
    /// Example output: "AB:CD:EF:01:23:45:..."
    pub fn thumbprint(&self) -> String {
        Sha256::digest(&self.0)
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl std::fmt::Debug for CertificateBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateBytes")
            .field("len", &self.0.len())
            .field("thumbprint", &self.thumbprint())
            .finish()
    }
}

impl From<Vec<u8>> for CertificateBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Base64 text form of a certificate, ready for the registration store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCredential(String);

impl EncodedCredential {
    /// Wrap already-encoded Base64 text without checking it.
    pub fn from_base64(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the Base64 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EncodedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode certificate bytes as standard, padded Base64.
///
/// # Errors
///
/// Returns [`RenewalError::Encoding`] if `cert` is empty.
pub fn encode(cert: &CertificateBytes) -> Result<EncodedCredential> {
    if cert.is_empty() {
        return Err(RenewalError::encoding("certificate contains no bytes"));
    }
    Ok(EncodedCredential(BASE64_STANDARD.encode(cert.as_bytes())))
}

/// Decode standard Base64 text back into certificate bytes.
///
/// Surrounding whitespace is ignored.
pub fn decode(credential: &EncodedCredential) -> Result<CertificateBytes> {
    BASE64_STANDARD
        .decode(credential.as_str().trim())
        .map(CertificateBytes)
        .map_err(|e| RenewalError::encoding(format!("invalid Base64: {e}")))
}
