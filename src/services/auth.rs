use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Turns a session token issued by the host product into an account id
pub trait AccountResolver: Send + Sync {
    /// `None` for missing, expired or forged tokens
    fn resolve_account_id(&self, token: &str) -> Option<String>;
}

/// Claims the engine reads from a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

/// HS256 session token verifier
pub struct JwtAccountResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAccountResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl AccountResolver for JwtAccountResolver {
    fn resolve_account_id(&self, token: &str) -> Option<String> {
        match decode::<SessionClaims>(token, &self.key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(data.claims.sub),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}

/// Resolver for deployments without accounts; every visitor is anonymous
pub struct AnonymousOnly;

impl AccountResolver for AnonymousOnly {
    fn resolve_account_id(&self, _token: &str) -> Option<String> {
        None
    }
}
