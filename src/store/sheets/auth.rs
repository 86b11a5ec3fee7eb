// src/store/sheets/auth.rs
// Google service-account authentication (OAuth 2.0 JWT bearer grant)

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{GoalError, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Scopes needed to find a spreadsheet by name and edit it
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// The fields of a service-account key file we use
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub async fn from_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            GoalError::Auth(format!(
                "cannot read service account key {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| GoalError::Auth(format!("malformed service account key: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Signed assertion for the token endpoint
pub fn build_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SCOPES.join(" "),
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + TOKEN_LIFETIME_SECS,
    };

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&Header::new(Algorithm::RS256), &claims, &signing_key)?)
}

/// Exchange the key for a fresh access token.
pub async fn access_token(http: &reqwest::Client, key: &ServiceAccountKey) -> Result<String> {
    let assertion = build_assertion(key, chrono::Utc::now().timestamp())?;

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GoalError::Auth(format!(
            "token exchange failed ({}): {}",
            status, body
        )));
    }

    let token: TokenResponse = response.json().await?;
    debug!(client_email = %key.client_email, "Obtained Google access token");
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_file_defaults_token_uri() {
        let key: ServiceAccountKey = serde_json::from_str(
            r#"{"type": "service_account", "client_email": "bot@proj.iam.gserviceaccount.com", "private_key": "pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(key.client_email, "bot@proj.iam.gserviceaccount.com");
    }

    #[test]
    fn test_bad_private_key_is_auth_error() {
        let key = ServiceAccountKey {
            client_email: "bot@proj.iam.gserviceaccount.com".into(),
            private_key: "not a pem".into(),
            token_uri: DEFAULT_TOKEN_URI.into(),
        };
        let err = build_assertion(&key, 1_700_000_000).unwrap_err();
        assert!(matches!(err, GoalError::Auth(_)));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_missing_key_file_is_auth_error() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/service_account.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, GoalError::Auth(_)));
    }
}
