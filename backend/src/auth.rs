use std::{fmt, sync::Arc};

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

/// Name of the cookie that carries the signed session token.
pub const SESSION_COOKIE: &str = "auth-token";

/// Role
///
/// The fixed set of account roles. Exactly one role is embedded in every session
/// token; a token naming anything else does not deserialize and is therefore
/// treated as if no token had been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    /// Regular taxpayer account.
    User,
    /// Back-office staff.
    Admin,
    /// Chartered accountant working client cases through the CA portal.
    CaExpert,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::CaExpert => "CA_EXPERT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims
///
/// Payload layout of the session token issued by the login flow.
/// `userId` is the canonical subject field; a registered `sub` claim is used
/// when `userId` is absent. A token carrying neither fails verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub email: String,
    pub role: Role,
    /// Issued At, seconds since the epoch.
    #[serde(default)]
    pub iat: i64,
    /// Expiration Time, seconds since the epoch. Mandatory.
    pub exp: i64,
}

/// AuthUser
///
/// A verified session identity. Produced only by a [`TokenVerifier`]; the gate
/// stores it in the request extensions of every pass-through request on a
/// protected page or API path, where handlers pick it up through the extractor below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl AuthUser {
    fn from_claims(claims: Claims) -> Option<Self> {
        let expires_at = DateTime::from_timestamp(claims.exp, 0)?;
        let id = claims.user_id.or(claims.sub)?;
        Some(Self {
            id,
            email: claims.email,
            role: claims.role,
            expires_at,
        })
    }
}

/// AuthUser Extractor Implementation
///
/// Reads the identity the access gate attached to the request. The gate has
/// already verified the token by the time a handler runs, so no cryptography
/// happens here. A handler mounted on a path the gate does not protect gets a
/// 401 rejection instead of a silently missing identity.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// TokenVerifier
///
/// The single seam between the gate and the signing scheme. Implementations
/// must collapse every failure (bad signature, malformed payload, unknown role,
/// expiry) into `None`.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<AuthUser>;
}

pub type VerifierState = Arc<dyn TokenVerifier>;

/// JwtVerifier
///
/// HS256 verifier keyed by the shared `JWT_SECRET`. Expiry is mandatory and
/// checked without leeway.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Option<AuthUser> {
        let token_data = match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                // Reasons stay at debug level; callers only ever see "unauthenticated".
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("session token expired"),
                    _ => tracing::debug!(error = %e, "session token rejected"),
                }
                return None;
            }
        };

        let user = AuthUser::from_claims(token_data.claims);
        if user.is_none() {
            tracing::debug!("session token carries no usable subject");
        }
        user
    }
}

/// issue_token
///
/// Signs a session token for the given identity, valid for `ttl` from now.
/// Uses the same claim layout and algorithm [`JwtVerifier`] expects.
pub fn issue_token(
    user_id: &str,
    email: &str,
    role: Role,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        user_id: Some(user_id.to_string()),
        sub: None,
        email: email.to_string(),
        role,
        iat: now,
        exp: now + ttl.num_seconds(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
