//! Webhook signature verification.
//!
//! The processor signs the raw request body with a shared secret and sends the result in the
//! `Stripe-Signature` header, formatted as `t=<unix ts>,v1=<hex hmac>`. The signed payload is
//! `"{timestamp}.{body}"`, so the timestamp cannot be swapped out without breaking the signature.
//! Several `v1` entries may be present while a secret is being rotated; any one of them matching
//! is sufficient.
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::SignatureError;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

type HmacSha256 = Hmac<Sha256>;

/// The hex-encoded HMAC-SHA256 of `"{timestamp}.{payload}"` under `secret`.
pub fn calculate_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().iter().map(|b| format!("{b:02x}")).collect()
}

/// Produce a complete signature header value for `payload`. The server only verifies signatures,
/// but test clients and fixtures need to create them.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!("t={timestamp},v1={}", calculate_signature(secret, timestamp, payload))
}

/// Split a signature header into its timestamp and the candidate `v1` signatures.
pub fn parse_signature_header(header: &str) -> Result<(i64, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(SignatureError::MalformedHeader(format!("Missing '=' in element '{part}'")));
        };
        match key {
            "t" => {
                let ts = value
                    .parse::<i64>()
                    .map_err(|e| SignatureError::MalformedHeader(format!("Invalid timestamp '{value}'. {e}")))?;
                timestamp = Some(ts);
            },
            "v1" => candidates.push(value),
            // Older scheme versions and unknown keys are ignored.
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| SignatureError::MalformedHeader("No timestamp element".to_string()))?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader("No v1 signature element".to_string()));
    }
    Ok((timestamp, candidates))
}

/// Verify a signature header against the raw payload bytes.
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let (timestamp, candidates) = parse_signature_header(header)?;
    if (now - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::StaleTimestamp);
    }
    let expected = calculate_signature(secret, timestamp, payload);
    if candidates.iter().any(|c| *c == expected.as_str()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
