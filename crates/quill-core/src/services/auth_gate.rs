//! Bearer-token verification plus admin allow-list lookup.

use std::sync::Arc;

use crate::ports::{AdminDirectory, AuthError, TokenClaims, TokenVerifier};

/// Outcome of [`AuthGate::verify`].
///
/// The gate never rejects anything itself. Callers decide whether a missing
/// identity means 401 or a missing admin flag means 403.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthResult {
    pub authenticated: bool,
    pub is_admin: bool,
    pub user_id: Option<String>,
    pub claims: Option<TokenClaims>,
    pub error: Option<String>,
}

impl AuthResult {
    fn rejected(error: AuthError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingAuth)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?
        .trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken("Empty bearer token".to_string()));
    }
    Ok(token)
}

pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    admins: Arc<dyn AdminDirectory>,
}

impl AuthGate {
    pub fn new(verifier: Arc<dyn TokenVerifier>, admins: Arc<dyn AdminDirectory>) -> Self {
        Self { verifier, admins }
    }

    pub async fn verify(&self, authorization: Option<&str>) -> AuthResult {
        let token = match bearer_token(authorization) {
            Ok(token) => token,
            Err(e) => return AuthResult::rejected(e),
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token rejected");
                return AuthResult::rejected(e);
            }
        };

        let is_admin = match self.admins.is_admin(&claims.user_id).await {
            Ok(is_admin) => is_admin,
            Err(e) => {
                tracing::error!(user_id = %claims.user_id, error = %e, "Admin lookup failed");
                false
            }
        };

        AuthResult {
            authenticated: true,
            is_admin,
            user_id: Some(claims.user_id.clone()),
            claims: Some(claims),
            error: None,
        }
    }
}
