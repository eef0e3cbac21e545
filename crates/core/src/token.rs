//! Integration tokens.
//!
//! A token is base64-encoded JSON `{"integrationId": "...", "secret": "..."}`.
//! Both parts are normalized by stripping `-` and concatenated to form the
//! [`IntegrationSecret`] used as the resolver cache key.
//!
//! Deployments that still hand out HS256 JWTs carrying a `projectId` claim
//! can verify them through [`LegacyTokenDecoder`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload {
    integration_id: String,
    secret: String,
}

/// Normalized integration id + secret, the lookup key for a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntegrationSecret(String);

impl IntegrationSecret {
    /// Decode a client-supplied integration token.
    pub fn decode(token: &str) -> Result<Self> {
        let raw = STANDARD.decode(token.trim())?;
        let payload: TokenPayload = serde_json::from_slice(&raw).map_err(Error::TokenPayload)?;

        let mut key = payload.integration_id.replace('-', "");
        key.push_str(&payload.secret.replace('-', ""));
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntegrationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
struct LegacyClaims {
    #[serde(rename = "projectId", default)]
    project_id: String,
}

/// Verifies deprecated JWT-format tokens and extracts their project id.
#[derive(Clone)]
pub struct LegacyTokenDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl LegacyTokenDecoder {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Old tokens were minted without exp; an exp that is present is still enforced.
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Returns the project id embedded in a valid token.
    pub fn decode(&self, token: &str) -> Result<String> {
        let data = jsonwebtoken::decode::<LegacyClaims>(token, &self.key, &self.validation)
            .map_err(|_| Error::JwtSignature)?;

        if data.claims.project_id.is_empty() {
            return Err(Error::EmptyProjectId);
        }
        Ok(data.claims.project_id)
    }
}

impl fmt::Debug for LegacyTokenDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyTokenDecoder").finish_non_exhaustive()
    }
}

/// Encode an integration token. Used by tooling and tests.
pub fn encode_token(integration_id: &str, secret: &str) -> String {
    let json = serde_json::json!({ "integrationId": integration_id, "secret": secret });
    STANDARD.encode(json.to_string())
}
