use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::claims::{Role, SessionClaims};
use super::provider::ClaimsError;

/// Key material used to verify session tokens.
///
/// - `RsaPem`: provider の公開鍵 (RS256, networkless verification)
/// - `Secret`: 共有シークレット (HS256, local development only)
#[derive(Clone)]
pub enum SessionKey {
    RsaPem(String),
    Secret(String),
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        match self {
            Self::RsaPem(_) => f.write_str("SessionKey::RsaPem(..)"),
            Self::Secret(_) => f.write_str("SessionKey::Secret(..)"),
        }
    }
}

/// Raw session token claims.
///
/// The provider puts custom claims under `metadata`; `role` is the only one we read.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokenClaims {
    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,

    // Null is the same as absent.
    #[serde(default)]
    pub metadata: Option<SessionMetadata>,
}

/// Custom claims. `role` stays raw JSON so that a wrong type is reported
/// as an unknown role instead of failing the whole token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub role: Option<serde_json::Value>,
}

/// Session token verifier.
///
/// - Key material is not printed by Debug.
#[derive(Clone)]
pub struct SessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl SessionVerifier {
    pub fn new(
        key: &SessionKey,
        issuer: Option<&str>,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, ClaimsError> {
        let (decoding_key, algorithm) = match key {
            SessionKey::RsaPem(pem) => (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256),
            SessionKey::Secret(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        // Session tokens carry `azp` rather than `aud`; only check it when configured.
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    // Verify signature + exp (+ iss/aud when configured) and decode.
    pub fn verify(&self, token: &str) -> Result<SessionTokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<SessionTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify, then convert into the claims the rest of the service uses.
    ///
    /// A role string we do not know is logged and mapped to `Role::None`:
    /// the caller stays signed in but gets no elevated access.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, ClaimsError> {
        let claims = self.verify(token)?;

        if claims.sub.trim().is_empty() {
            return Err(ClaimsError::EmptyClaim("sub"));
        }
        if claims.exp == 0 {
            return Err(ClaimsError::EmptyClaim("exp"));
        }

        let role = match Role::from_metadata(claims.metadata.as_ref().and_then(|m| m.role.as_ref())) {
            Ok(role) => role,
            Err(err) => {
                tracing::warn!(
                    user_id = %claims.sub,
                    error = %err,
                    "unrecognized role claim, treating as no role"
                );
                Role::None
            }
        };

        Ok(SessionClaims {
            user_id: claims.sub,
            session_id: claims.sid,
            role,
        })
    }
}
