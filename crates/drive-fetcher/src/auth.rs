//! Service-account token exchange (JWT bearer grant).
//!
//! The credential file is the JSON key downloaded for a service account. A
//! short-lived RS256 assertion is signed with its private key and exchanged at
//! `token_uri` for an access token, which is then reused for the whole run.

use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use drive_tree_common::DriveTreeError;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use serde::Deserialize;

pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, DriveTreeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DriveTreeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content).map_err(|e| match e {
            DriveTreeError::Config(msg) => {
                DriveTreeError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, DriveTreeError> {
        serde_json::from_str(content)
            .map_err(|e| DriveTreeError::Config(format!("invalid service account key: {}", e)))
    }

    /// Signed `header.claims.signature` assertion valid for one hour from `issued_at`.
    pub fn sign_assertion(&self, scope: &str, issued_at: u64) -> Result<String, DriveTreeError> {
        let mut header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
        if let Some(ref kid) = self.private_key_id {
            header["kid"] = serde_json::Value::String(kid.clone());
        }
        let claims = serde_json::json!({
            "iss": self.client_email,
            "scope": scope,
            "aud": self.token_uri,
            "iat": issued_at,
            "exp": issued_at + ASSERTION_LIFETIME_SECS,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );

        let key_error = |e: openssl::error::ErrorStack| {
            DriveTreeError::Config(format!("unusable service account private key: {}", e))
        };
        let pkey = PKey::private_key_from_pem(self.private_key.as_bytes()).map_err(key_error)?;
        let mut signer = Signer::new(MessageDigest::sha256(), &pkey).map_err(key_error)?;
        signer.update(signing_input.as_bytes()).map_err(key_error)?;
        let signature = signer.sign_to_vec().map_err(key_error)?;

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Exchange a signed assertion for an access token.
pub async fn fetch_access_token(
    client: &reqwest::Client,
    key: &ServiceAccountKey,
    scope: &str,
) -> Result<AccessToken, DriveTreeError> {
    let assertion = key.sign_assertion(scope, unix_now())?;

    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| DriveTreeError::RemoteAccess(format!("token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(DriveTreeError::RemoteAccess(format!(
            "token request failed ({}): {}",
            status, error_text
        )));
    }

    response
        .json::<AccessToken>()
        .await
        .map_err(|e| DriveTreeError::RemoteAccess(format!("failed to parse token response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::rsa::Rsa;
    use openssl::sign::Verifier;

    fn test_key() -> (ServiceAccountKey, PKey<openssl::pkey::Private>) {
        let rsa = Rsa::generate(2048).unwrap();
        let pkey = PKey::from_rsa(rsa).unwrap();
        let pem = String::from_utf8(pkey.private_key_to_pem_pkcs8().unwrap()).unwrap();
        let key = ServiceAccountKey {
            client_email: "builder@project.iam.gserviceaccount.com".to_string(),
            private_key: pem,
            private_key_id: Some("kid-1".to_string()),
            token_uri: "https://oauth2.example/token".to_string(),
        };
        (key, pkey)
    }

    fn decode_part(part: &str) -> serde_json::Value {
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(part).unwrap()).unwrap()
    }

    #[test]
    fn test_assertion_claims_and_signature() {
        let (key, pkey) = test_key();
        let jwt = key.sign_assertion(DRIVE_READONLY_SCOPE, 1_700_000_000).unwrap();
        let parts: Vec<&str> = jwt.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header = decode_part(parts[0]);
        assert_eq!(header["alg"], "RS256");
        assert_eq!(header["kid"], "kid-1");

        let claims = decode_part(parts[1]);
        assert_eq!(claims["iss"], "builder@project.iam.gserviceaccount.com");
        assert_eq!(claims["scope"], DRIVE_READONLY_SCOPE);
        assert_eq!(claims["aud"], "https://oauth2.example/token");
        assert_eq!(claims["exp"], 1_700_003_600u64);

        let signature = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        let mut verifier = Verifier::new(MessageDigest::sha256(), &pkey).unwrap();
        verifier
            .update(format!("{}.{}", parts[0], parts[1]).as_bytes())
            .unwrap();
        assert!(verifier.verify(&signature).unwrap());
    }

    #[test]
    fn test_bad_private_key_is_config_error() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "a@b", "private_key": "not a pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        let err = key.sign_assertion(DRIVE_READONLY_SCOPE, 0).unwrap_err();
        assert!(matches!(err, DriveTreeError::Config(_)));
    }

    #[test]
    fn test_key_file_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"type": "service_account"}"#).unwrap();
        let err = ServiceAccountKey::from_file(&path).unwrap_err();
        match err {
            DriveTreeError::Config(msg) => assert!(msg.contains("credentials.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_debug_hides_private_key() {
        let (key, _) = test_key();
        let shown = format!("{:?}", key);
        assert!(!shown.contains("PRIVATE KEY"));
        assert!(shown.contains("builder@project"));
    }
}
