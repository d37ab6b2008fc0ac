use crate::core::{Identity, Role, Viewer};
use crate::models::UserId;
use crate::routes::error::ApiError;
use crate::routes::AppState;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

/// Access token claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    pub exp: u64,
}

impl Claims {
    pub fn for_identity(identity: &Identity, expires_at: u64) -> Self {
        Self {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            role: identity.role,
            is_staff: identity.is_staff,
            is_superuser: identity.is_superuser,
            exp: expires_at,
        }
    }

    fn into_identity(self) -> Result<Identity, ApiError> {
        let user_id: UserId = self
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("Invalid subject in token".into()))?;

        Ok(Identity {
            user_id,
            username: self.username,
            role: self.role,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        })
    }
}

/// HS256 signing and verification keys
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: &[u8], leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!("Rejected access token: {}", e);
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;
        data.claims.into_identity()
    }
}

fn resolve_viewer(req: &HttpRequest) -> Result<Viewer, ApiError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(Viewer::Anonymous);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".into()))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("Application state missing".into()))?;

    state.tokens.verify(token).map(Viewer::Authenticated)
}

/// Resolves the request's viewer from its bearer token
///
/// No `Authorization` header means anonymous; a present but invalid one is
/// rejected with 401 rather than silently downgraded.
impl FromRequest for Viewer {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_viewer(req))
    }
}

pub fn require_user(viewer: &Viewer) -> Result<&Identity, ApiError> {
    viewer
        .identity()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))
}

pub fn require_elevated(viewer: &Viewer) -> Result<&Identity, ApiError> {
    let identity = require_user(viewer)?;
    if !viewer.is_elevated() {
        return Err(ApiError::Forbidden("Staff access required".into()));
    }
    Ok(identity)
}

pub fn require_super_admin(viewer: &Viewer) -> Result<&Identity, ApiError> {
    let identity = require_user(viewer)?;
    if !viewer.is_super_admin() {
        return Err(ApiError::Forbidden("Super admin access required".into()));
    }
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::access::viewer;
    use actix_web::ResponseError;

    fn keys() -> TokenKeys {
        TokenKeys::new(b"test-secret", 0)
    }

    fn far_future() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys();
        let identity = Identity {
            user_id: 42,
            username: "marie".into(),
            role: Role::PageAdmin,
            is_staff: false,
            is_superuser: false,
        };
        let token = keys.issue(&Claims::for_identity(&identity, far_future())).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), identity);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys();
        let mut claims = Claims::for_identity(
            viewer(1, Role::User).identity().unwrap(),
            far_future(),
        );
        claims.exp = 1;
        let token = keys.issue(&claims).unwrap();
        assert!(matches!(keys.verify(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::for_identity(viewer(1, Role::User).identity().unwrap(), far_future());
        let token = TokenKeys::new(b"other", 0).issue(&claims).unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let keys = keys();
        let mut claims = Claims::for_identity(viewer(1, Role::User).identity().unwrap(), far_future());
        claims.sub = "abc".into();
        let token = keys.issue(&claims).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_guards() {
        assert_eq!(
            require_user(&Viewer::Anonymous).unwrap_err().status_code(),
            actix_web::http::StatusCode::UNAUTHORIZED
        );
        let user = viewer(1, Role::User);
        assert!(require_user(&user).is_ok());
        assert_eq!(
            require_elevated(&user).unwrap_err().status_code(),
            actix_web::http::StatusCode::FORBIDDEN
        );
        let admin = viewer(2, Role::PageAdmin);
        assert!(require_elevated(&admin).is_ok());
        assert!(require_super_admin(&admin).is_err());
        assert!(require_super_admin(&viewer(3, Role::SuperAdmin)).is_ok());
    }
}
