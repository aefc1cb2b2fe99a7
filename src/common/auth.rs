//! Request signing and API credentials
//!
//! All supported exchanges sign requests with HMAC-SHA256 keyed by the API
//! secret. Binance, MEXC and Bybit expect the digest hex-encoded, Bitget
//! expects it base64-encoded.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(payload: &str, secret: &str) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// HMAC-SHA256 signature as lowercase hex
pub fn sign_hex(payload: &str, secret: &str) -> String {
    hex::encode(hmac_sha256(payload, secret))
}

/// HMAC-SHA256 signature as standard base64
pub fn sign_base64(payload: &str, secret: &str) -> String {
    BASE64.encode(hmac_sha256(payload, secret))
}

/// API credentials for one exchange account
///
/// Field names follow the `api_keys.json` layout: `apiKey`, `secret` and an
/// optional `password` (Bitget's passphrase).
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "apiKey")]
    api_key: String,
    secret: String,
    #[serde(default)]
    password: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn sign_hex(&self, payload: &str) -> String {
        sign_hex(payload, &self.secret)
    }

    pub fn sign_base64(&self, payload: &str) -> String {
        sign_base64(payload, &self.secret)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_hex_binance_vector() {
        // Example request from the Binance signed-endpoint documentation
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";

        assert_eq!(
            sign_hex(query, secret),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_sign_rfc4231_case_2() {
        let payload = "what do ya want for nothing?";

        assert_eq!(
            sign_hex(payload, "Jefe"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        assert_eq!(
            sign_base64(payload, "Jefe"),
            "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM="
        );
    }

    #[test]
    fn test_empty_payload() {
        let signature = sign_hex("", "test_secret");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_credentials_deserialize() {
        let creds: Credentials =
            serde_json::from_str(r#"{"apiKey": "key", "secret": "s3cret", "password": "pass"}"#)
                .unwrap();
        assert_eq!(creds.api_key(), "key");
        assert_eq!(creds.secret(), "s3cret");
        assert_eq!(creds.password(), Some("pass"));
        assert_eq!(creds.sign_hex("x"), sign_hex("x", "s3cret"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("key", "s3cret").with_password("pass");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("key"));
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("pass\""));
    }
}
