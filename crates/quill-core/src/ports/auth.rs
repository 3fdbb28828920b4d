//! Authentication and authorization ports.

use async_trait::async_trait;

use crate::error::RepoError;

/// Claims carried by an identity-provider token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub exp: i64,
}

/// Verifies bearer tokens issued by the identity provider. This service never issues tokens.
pub trait TokenVerifier: Send + Sync {
    /// Validate and decode a token.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Admin allow-list keyed by user id.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn is_admin(&self, user_id: &str) -> Result<bool, RepoError>;

    /// Add a user to the allow-list. Granting twice is a no-op.
    async fn grant(&self, user_id: &str) -> Result<(), RepoError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}
