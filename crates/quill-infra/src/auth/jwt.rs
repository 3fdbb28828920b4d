//! JWT verification for identity-provider tokens.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use quill_core::ports::{AuthError, TokenClaims, TokenVerifier};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// Key material used to check token signatures.
#[derive(Clone)]
pub enum JwtKey {
    /// HS256 shared secret.
    Secret(String),
    /// RS256 public key in PEM form.
    RsaPem(String),
}

impl fmt::Debug for JwtKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtKey::Secret(_) => f.write_str("Secret(<redacted>)"),
            JwtKey::RsaPem(_) => f.write_str("RsaPem(..)"),
        }
    }
}

/// JWT verifier configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub key: JwtKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            key: JwtKey::Secret(DEFAULT_SECRET.to_string()),
            issuer: None,
            audience: None,
            leeway_secs: 60,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let key = match std::env::var("AUTH_JWT_PUBLIC_KEY") {
            Ok(pem) if !pem.trim().is_empty() => JwtKey::RsaPem(pem.replace("\\n", "\n")),
            _ => {
                let secret = std::env::var("AUTH_JWT_SECRET")
                    .unwrap_or_else(|_| DEFAULT_SECRET.to_string());
                if secret == DEFAULT_SECRET {
                    let is_production = std::env::var("RUST_ENV")
                        .map(|v| v == "production" || v == "prod")
                        .unwrap_or(false);

                    if is_production {
                        tracing::error!(
                            "SECURITY: Using default JWT secret in production! Set AUTH_JWT_SECRET or AUTH_JWT_PUBLIC_KEY."
                        );
                    } else {
                        tracing::warn!("Using default JWT secret. Set AUTH_JWT_SECRET for production use.");
                    }
                }
                JwtKey::Secret(secret)
            }
        };

        Self {
            key,
            issuer: std::env::var("AUTH_JWT_ISSUER").ok().filter(|s| !s.is_empty()),
            audience: std::env::var("AUTH_JWT_AUDIENCE").ok().filter(|s| !s.is_empty()),
            leeway_secs: std::env::var("AUTH_JWT_LEEWAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        }
    }
}

/// Claims read from the token body. Unknown claims are ignored.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    exp: i64,
}

/// Stateless JWT verifier.
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(config: JwtConfig) -> Result<Self, AuthError> {
        let (decoding_key, algorithm) = match &config.key {
            JwtKey::Secret(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            JwtKey::RsaPem(pem) => (
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::InvalidToken(format!("Bad RSA public key: {e}")))?,
                Algorithm::RS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = token_data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("Empty subject".to_string()));
        }

        Ok(TokenClaims {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
            exp: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        email: &'a str,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aud: Option<&'a str>,
    }

    fn config(issuer: Option<&str>, audience: Option<&str>) -> JwtConfig {
        JwtConfig {
            key: JwtKey::Secret("test-secret-key".to_string()),
            issuer: issuer.map(String::from),
            audience: audience.map(String::from),
            leeway_secs: 0,
        }
    }

    fn token(secret: &str, exp_offset: TimeDelta, iss: Option<&str>, aud: Option<&str>) -> String {
        let claims = TestClaims {
            sub: "user-123",
            email: "reader@example.com",
            exp: (Utc::now() + exp_offset).timestamp(),
            iss,
            aud,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = JwtTokenVerifier::new(config(None, None)).unwrap();
        let jwt = token("test-secret-key", TimeDelta::hours(1), None, None);

        let claims = verifier.verify(&jwt).unwrap();

        assert_eq!(claims.user_id, "user-123");
        assert_eq!(claims.email.as_deref(), Some("reader@example.com"));
        assert!(claims.name.is_none());
    }

    #[test]
    fn test_verify_garbage_token() {
        let verifier = JwtTokenVerifier::new(config(None, None)).unwrap();

        let result = verifier.verify("invalid-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_expired_token() {
        let verifier = JwtTokenVerifier::new(config(None, None)).unwrap();
        let jwt = token("test-secret-key", TimeDelta::hours(-1), None, None);

        assert!(matches!(verifier.verify(&jwt), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let verifier = JwtTokenVerifier::new(config(None, None)).unwrap();
        let jwt = token("some-other-secret", TimeDelta::hours(1), None, None);

        assert!(verifier.verify(&jwt).is_err());
    }

    #[test]
    fn test_verify_wrong_issuer() {
        let verifier = JwtTokenVerifier::new(config(Some("issuer-a"), None)).unwrap();
        let jwt = token("test-secret-key", TimeDelta::hours(1), Some("issuer-b"), None);

        assert!(verifier.verify(&jwt).is_err());

        let jwt = token("test-secret-key", TimeDelta::hours(1), Some("issuer-a"), None);
        assert!(verifier.verify(&jwt).is_ok());
    }

    #[test]
    fn test_verify_audience() {
        let verifier = JwtTokenVerifier::new(config(None, Some("quill"))).unwrap();

        let jwt = token("test-secret-key", TimeDelta::hours(1), None, Some("quill"));
        assert!(verifier.verify(&jwt).is_ok());

        let jwt = token("test-secret-key", TimeDelta::hours(1), None, Some("elsewhere"));
        assert!(verifier.verify(&jwt).is_err());
    }

    #[test]
    fn test_bad_rsa_key_is_rejected() {
        let result = JwtTokenVerifier::new(JwtConfig {
            key: JwtKey::RsaPem("not a pem".to_string()),
            ..JwtConfig::default()
        });
        assert!(result.is_err());
    }
}
