//! Webhook payload signature verification.
//!
//! The provider signs each POST body with the app secret and sends the digest
//! as `X-Hub-Signature: sha1=<hex>` (or `X-Hub-Signature-256: sha256=<hex>`).

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use tracing::warn;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// HMAC algorithm used to sign webhook payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// HMAC-SHA1, carried in `X-Hub-Signature`.
    #[default]
    Sha1,
    /// HMAC-SHA256, carried in `X-Hub-Signature-256`.
    Sha256,
}

impl SignatureAlgorithm {
    /// Request header that carries the signature for this algorithm.
    pub fn header_name(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "x-hub-signature",
            SignatureAlgorithm::Sha256 => "x-hub-signature-256",
        }
    }

    /// Prefix in front of the hex digest.
    pub fn prefix(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1=",
            SignatureAlgorithm::Sha256 => "sha256=",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureAlgorithm::Sha1 => f.write_str("sha1"),
            SignatureAlgorithm::Sha256 => f.write_str("sha256"),
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(format!("unsupported signature algorithm: {other}")),
        }
    }
}

/// Compute the full header value (`<algo>=<hex>`) for a payload.
pub fn sign_payload(secret: &str, algorithm: SignatureAlgorithm, body: &[u8]) -> Option<String> {
    let digest = match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
            mac.update(body);
            hex::encode(mac.finalize().into_bytes())
        }
        SignatureAlgorithm::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
            mac.update(body);
            hex::encode(mac.finalize().into_bytes())
        }
    };

    Some(format!("{}{}", algorithm.prefix(), digest))
}

/// Verify an `X-Hub-Signature` style header against the raw request body.
///
/// Returns `false` when the secret or header is empty, the prefix does not
/// match the algorithm, or the digest differs.
pub fn verify_hub_signature(
    secret: &str,
    algorithm: SignatureAlgorithm,
    body: &[u8],
    signature_header: &str,
) -> bool {
    if secret.is_empty() || signature_header.is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature_header.is_empty(),
            "hub_signature_missing_fields"
        );
        return false;
    }

    if !signature_header.starts_with(algorithm.prefix()) {
        warn!(algorithm = %algorithm, "hub_signature_wrong_prefix");
        return false;
    }

    let digest = match hex::decode(&signature_header[algorithm.prefix().len()..]) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(algorithm = %algorithm, error = %e, "hub_signature_invalid_hex");
            return false;
        }
    };

    // verify_slice compares in constant time; hex::decode accepts either case.
    let verified = match algorithm {
        SignatureAlgorithm::Sha1 => HmacSha1::new_from_slice(secret.as_bytes()).map(|mut mac| {
            mac.update(body);
            mac.verify_slice(&digest).is_ok()
        }),
        SignatureAlgorithm::Sha256 => HmacSha256::new_from_slice(secret.as_bytes()).map(|mut mac| {
            mac.update(body);
            mac.verify_slice(&digest).is_ok()
        }),
    };

    let valid = match verified {
        Ok(valid) => valid,
        Err(_) => {
            warn!("hub_signature_invalid_key");
            return false;
        }
    };

    if !valid {
        warn!(
            algorithm = %algorithm,
            digest_length = digest.len(),
            "hub_signature_mismatch"
        );
    }

    valid
}
