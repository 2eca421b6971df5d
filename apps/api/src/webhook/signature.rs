//! Webhook signature verification.
//!
//! The provider signs each delivery with a shared secret over the exact
//! public URL plus the form parameters sorted by key, each key immediately
//! followed by its value. The result travels Base64-encoded in
//! [`SIGNATURE_HEADER`]. Comparison is constant-time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

pub fn compute_signature(secret: &str, url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    BASE64.encode(mac.finalize().into_bytes())
}

pub fn verify_signature(
    secret: &str,
    url: &str,
    params: &[(String, String)],
    provided: &str,
) -> bool {
    let expected = compute_signature(secret, url, params);
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<(String, String)> {
        vec![
            ("MessageSid".to_string(), "SM123".to_string()),
            ("From".to_string(), "whatsapp:+31612345678".to_string()),
            ("Body".to_string(), "fundering gestort".to_string()),
        ]
    }

    #[test]
    fn test_signature_round_trip_and_tamper_detection() {
        let secret = "topsecret";
        let url = "https://api.bouwlog.nl/webhooks/messages";

        let sig = compute_signature(secret, url, &params());
        assert!(verify_signature(secret, url, &params(), &sig));
        assert!(!verify_signature(secret, url, &params(), "forged"));
        assert!(!verify_signature("othersecret", url, &params(), &sig));

        let mut tampered = params();
        tampered[2].1 = "dak af".to_string();
        assert!(!verify_signature(secret, url, &tampered, &sig));
    }

    #[test]
    fn test_signature_is_independent_of_parameter_order() {
        let secret = "topsecret";
        let url = "https://api.bouwlog.nl/webhooks/messages";

        let mut reversed = params();
        reversed.reverse();
        assert_eq!(
            compute_signature(secret, url, &params()),
            compute_signature(secret, url, &reversed)
        );
    }

    #[test]
    fn test_signature_binds_the_url() {
        let secret = "topsecret";
        let sig = compute_signature(secret, "https://api.bouwlog.nl/webhooks/messages", &params());
        assert!(!verify_signature(
            secret,
            "https://evil.example/webhooks/messages",
            &params(),
            &sig
        ));
    }
}
