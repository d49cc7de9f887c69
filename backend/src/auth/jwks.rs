use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

/// Verified claim profile extracted from a bearer token.
///
/// This is the input to user reconciliation: `sub` is the permanent
/// identifier, the rest are optional profile attributes.
#[derive(Debug, Clone)]
pub struct Profile {
    pub sub: String,
    pub nickname: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    InvalidFormat,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("JWKS fetch error: {0}")]
    JwksFetch(String),
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),
}

/// JWKS key set response.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

/// JWT claims. Auth0 tenants deliver profile attributes either as bare
/// claims or namespaced under a custom URL prefix, so unknown keys are
/// kept for suffix lookup.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// A direct claim wins; otherwise fall back to any namespaced claim
    /// whose key ends with the given suffix (e.g. `https://x/email`).
    fn claim_or_suffix(&self, direct: &Option<String>, suffix: &str) -> Option<String> {
        if let Some(value) = direct {
            return Some(value.clone());
        }
        self.extra
            .iter()
            .find(|(key, _)| key.ends_with(suffix))
            .and_then(|(_, value)| value.as_str().map(|s| s.to_string()))
    }

    fn into_profile(self) -> Profile {
        Profile {
            nickname: self.claim_or_suffix(&self.nickname, "/nickname"),
            name: self.claim_or_suffix(&self.name, "/name"),
            email: self.claim_or_suffix(&self.email, "/email"),
            sub: self.sub,
        }
    }
}

/// Client for fetching and caching JWKS signing keys.
pub struct JwksClient {
    http_client: Client,
    jwks_uri: String,
    keys: Arc<RwLock<HashMap<String, DecodingKey>>>,
    issuer: String,
    audience: String,
}

impl JwksClient {
    pub async fn new(jwks_uri: &str, issuer: &str, audience: &str) -> Result<Self, AuthError> {
        let client = Self {
            http_client: Client::new(),
            jwks_uri: jwks_uri.to_string(),
            keys: Arc::new(RwLock::new(HashMap::new())),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
        };

        // Fetch keys initially
        client.refresh_keys().await?;

        Ok(client)
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        tracing::info!("Fetching JWKS from {}", self.jwks_uri);

        let response: JwksResponse = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetch(e.to_string()))?;

        let mut keys = self.keys.write().await;
        keys.clear();

        for jwk in response.keys {
            if jwk.kty == "RSA" {
                if let (Some(n), Some(e)) = (&jwk.n, &jwk.e) {
                    match DecodingKey::from_rsa_components(n, e) {
                        Ok(key) => {
                            keys.insert(jwk.kid.clone(), key);
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse RSA key {}: {}", jwk.kid, e);
                        }
                    }
                }
            }
        }

        tracing::info!("Loaded {} JWKS keys", keys.len());
        Ok(())
    }

    /// Authenticate a request by validating the Bearer token against the
    /// cached key set. Checks signature, issuer, audience and expiry.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Profile, AuthError> {
        let auth_header = headers
            .get("authorization")
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("Missing kid in token header".to_string()))?;

        let keys = self.keys.read().await;
        let key = keys
            .get(&kid)
            .ok_or_else(|| AuthError::KeyNotFound(kid.clone()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data =
            decode::<Claims>(token, key, &validation).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims.into_profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use serde_json::json;

    fn claims_from_json(value: serde_json::Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_profile_from_bare_claims() {
        let claims = claims_from_json(json!({
            "sub": "auth0|123456",
            "nickname": "bob",
            "name": "Bob Smith",
            "email": "bob@example.com",
            "exp": 0, "iat": 0
        }));
        let profile = claims.into_profile();
        assert_eq!(profile.sub, "auth0|123456");
        assert_eq!(profile.nickname.as_deref(), Some("bob"));
        assert_eq!(profile.name.as_deref(), Some("Bob Smith"));
        assert_eq!(profile.email.as_deref(), Some("bob@example.com"));
    }

    #[test]
    fn test_profile_from_namespaced_claims() {
        let claims = claims_from_json(json!({
            "sub": "auth0|123456",
            "https://invest.example.com/email": "bob@example.com",
            "https://invest.example.com/nickname": "bob",
            "exp": 0, "iat": 0
        }));
        let profile = claims.into_profile();
        assert_eq!(profile.email.as_deref(), Some("bob@example.com"));
        assert_eq!(profile.nickname.as_deref(), Some("bob"));
        assert_eq!(profile.name, None);
    }

    #[test]
    fn test_bare_claim_wins_over_namespaced() {
        let claims = claims_from_json(json!({
            "sub": "auth0|123456",
            "email": "direct@example.com",
            "https://invest.example.com/email": "namespaced@example.com",
            "exp": 0, "iat": 0
        }));
        let profile = claims.into_profile();
        assert_eq!(profile.email.as_deref(), Some("direct@example.com"));
    }

    #[test]
    fn test_non_string_namespaced_claim_ignored() {
        let claims = claims_from_json(json!({
            "sub": "auth0|123456",
            "https://invest.example.com/email": 42,
            "exp": 0, "iat": 0
        }));
        let profile = claims.into_profile();
        assert_eq!(profile.email, None);
    }

    #[test]
    fn test_profile_with_sub_only() {
        let claims = claims_from_json(json!({"sub": "auth0|xyz", "exp": 0, "iat": 0}));
        let profile = claims.into_profile();
        assert_eq!(profile.sub, "auth0|xyz");
        assert!(profile.nickname.is_none());
        assert!(profile.name.is_none());
        assert!(profile.email.is_none());
    }

    #[test]
    fn test_bearer_token_extraction_valid() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        let value = headers.get("authorization").and_then(|v| v.to_str().ok());
        assert_eq!(value.and_then(|v| v.strip_prefix("Bearer ")), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_extraction_basic_auth() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        let value = headers.get("authorization").and_then(|v| v.to_str().ok());
        assert_eq!(value.and_then(|v| v.strip_prefix("Bearer ")), None);
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(AuthError::MissingHeader.to_string(), "Missing Authorization header");
        assert_eq!(
            AuthError::InvalidFormat.to_string(),
            "Invalid Authorization header format"
        );
        assert!(AuthError::InvalidToken("bad".to_string())
            .to_string()
            .contains("Invalid token"));
        assert!(AuthError::KeyNotFound("kid123".to_string())
            .to_string()
            .contains("kid123"));
    }
}
