//! TC3-HMAC-SHA256 request signing.
//!
//! Only the headers `content-type` and `host` are signed, which is the
//! minimal set the API accepts for a JSON POST to `/`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::{config::SERVICE, ClientError, Credentials};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host";

fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

fn hmac_sha256(key: &[u8], message: &str) -> Result<Vec<u8>, ClientError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| ClientError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Value of the `Authorization` header for a POST of `payload` to `host`.
pub fn authorization(
    credentials: &Credentials,
    host: &str,
    payload: &str,
    now: DateTime<Utc>,
) -> Result<String, ClientError> {
    let date = now.format("%Y-%m-%d").to_string();
    let scope = format!("{date}/{SERVICE}/tc3_request");

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{CONTENT_TYPE}\nhost:{host}\n\n{SIGNED_HEADERS}\n{}",
        sha256_hex(payload)
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{}\n{scope}\n{}",
        now.timestamp(),
        sha256_hex(&canonical_request)
    );

    let secret_date = hmac_sha256(format!("TC3{}", credentials.secret_key()).as_bytes(), &date)?;
    let secret_service = hmac_sha256(&secret_date, SERVICE)?;
    let secret_signing = hmac_sha256(&secret_service, "tc3_request")?;
    let signature = hex::encode(hmac_sha256(&secret_signing, &string_to_sign)?);

    Ok(format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        credentials.secret_id()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_known_signature() {
        let credentials = Credentials::new(
            "AKIDz8krbsJ5yKBZQpn74WFkmLPx3EXAMPLE",
            "Gu5t9xGARNpq86cd98joQYCN3EXAMPLE",
        );
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let header = authorization(
            &credentials,
            "trtc.ai.tencentcloudapi.com",
            r#"{"Text":"hi"}"#,
            now,
        )
        .unwrap();

        assert_eq!(
            header,
            "TC3-HMAC-SHA256 Credential=AKIDz8krbsJ5yKBZQpn74WFkmLPx3EXAMPLE/2023-11-14/trtc/tc3_request, \
             SignedHeaders=content-type;host, \
             Signature=ba40681f32401bea5c32f6a1e5b5441c02afa9beecdd0f829e0ba2c06cfb4290"
        );
    }

    #[test]
    fn test_payload_hash() {
        assert_eq!(
            sha256_hex(r#"{"Text":"hi"}"#),
            "a8d48ba9bd1a7f6121d86ef3610e5ad8a98bf7c128ad3c8da244db5b723271e0"
        );
    }

    #[test]
    fn test_signature_depends_on_payload() {
        let credentials = Credentials::new("id", "key");
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let a = authorization(&credentials, "h", "a", now).unwrap();
        let b = authorization(&credentials, "h", "b", now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_secret_key_still_signs() {
        let credentials = Credentials::new("id", "");
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let header = authorization(&credentials, "h", "", now).unwrap();
        assert!(header.starts_with("TC3-HMAC-SHA256 Credential=id/2023-11-14/trtc/tc3_request"));
    }
}
