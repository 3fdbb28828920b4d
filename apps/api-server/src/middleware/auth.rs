//! Authentication extractors backed by the auth gate.
//!
//! Three flavours, from lenient to strict:
//! - [`OptionalIdentity`] never fails and reports what the gate found.
//! - [`Identity`] requires a valid bearer token (401 otherwise).
//! - [`AdminIdentity`] also requires the admin flag (403 otherwise).

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;
use std::sync::Arc;

use quill_core::domain::ActivityProfile;
use quill_core::services::{AuthResult, Commenter};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated caller.
///
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.display_name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub is_admin: bool,
}

impl Identity {
    /// Name shown next to the caller's comments.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Anonymous".to_string())
    }

    pub fn commenter(&self) -> Commenter {
        Commenter {
            user_id: self.user_id.clone(),
            user_name: self.display_name(),
            user_photo: self.picture.clone(),
        }
    }

    pub fn profile(&self) -> ActivityProfile {
        ActivityProfile {
            user_id: self.user_id.clone(),
            user_name: self.display_name(),
            user_email: self.email.clone(),
            user_photo: self.picture.clone(),
        }
    }
}

impl TryFrom<AuthResult> for Identity {
    type Error = AppError;

    fn try_from(result: AuthResult) -> Result<Self, Self::Error> {
        match (result.authenticated, result.claims) {
            (true, Some(claims)) => Ok(Self {
                user_id: claims.user_id,
                email: claims.email,
                name: claims.name,
                picture: claims.picture,
                is_admin: result.is_admin,
            }),
            _ => Err(AppError::Unauthorized(
                result
                    .error
                    .unwrap_or_else(|| "Authentication required".to_string()),
            )),
        }
    }
}

/// Run the gate against the request's `Authorization` header.
fn check(req: &HttpRequest) -> LocalBoxFuture<'static, Result<AuthResult, AppError>> {
    let gate = req
        .app_data::<web::Data<AppState>>()
        .map(|state| Arc::clone(&state.gate));
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(String::from);

    Box::pin(async move {
        let Some(gate) = gate else {
            tracing::error!("AppState not found in app data");
            return Err(AppError::Internal("Server configuration error".to_string()));
        };
        Ok(gate.verify(authorization.as_deref()).await)
    })
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = check(req);
        Box::pin(async move { Identity::try_from(result.await?) })
    }
}

/// Authenticated caller on the admin allow-list.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

impl std::ops::Deref for AdminIdentity {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

impl FromRequest for AdminIdentity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = check(req);
        Box::pin(async move {
            let identity = Identity::try_from(result.await?)?;
            if !identity.is_admin {
                tracing::warn!(user_id = %identity.user_id, "Admin route refused");
                return Err(AppError::Forbidden);
            }
            Ok(AdminIdentity(identity))
        })
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = check(req);
        Box::pin(async move { Ok(OptionalIdentity(Identity::try_from(result.await?).ok())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::ports::TokenClaims;

    fn claims(name: Option<&str>, email: Option<&str>) -> TokenClaims {
        TokenClaims {
            user_id: "u1".into(),
            email: email.map(String::from),
            name: name.map(String::from),
            picture: None,
            exp: 0,
        }
    }

    #[test]
    fn unauthenticated_result_carries_gate_error() {
        let result = AuthResult {
            error: Some("Token expired".into()),
            ..AuthResult::default()
        };
        match Identity::try_from(result) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn display_name_prefers_name_then_email() {
        let with = |c: TokenClaims| {
            Identity::try_from(AuthResult {
                authenticated: true,
                user_id: Some(c.user_id.clone()),
                claims: Some(c),
                ..AuthResult::default()
            })
            .unwrap()
            .display_name()
        };

        assert_eq!(with(claims(Some("Ada"), Some("ada@example.com"))), "Ada");
        assert_eq!(with(claims(None, Some("ada@example.com"))), "ada@example.com");
        assert_eq!(with(claims(None, None)), "Anonymous");
    }
}
