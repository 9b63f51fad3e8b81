use axum::{
    extract::FromRequestParts,
    http::{Method, Request, request::Parts},
};
use chrono::{Duration, Utc};
use filing_gate::{
    auth::{AuthUser, JwtVerifier, Role, TokenVerifier, issue_token},
    error::ApiError,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::json;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn token_for(role: Role, ttl: Duration) -> String {
    issue_token("user-42", "ca@example.com", role, TEST_JWT_SECRET, ttl).unwrap()
}

fn sign_raw(payload: serde_json::Value, secret: &str) -> String {
    encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn get_request_parts() -> Parts {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/me")
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

// --- Verification ---

#[tokio::test]
async fn test_verify_valid_token() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let token = token_for(Role::CaExpert, Duration::hours(1));

    let user = verifier.verify(&token).await.expect("token should verify");
    assert_eq!(user.id, "user-42");
    assert_eq!(user.email, "ca@example.com");
    assert_eq!(user.role, Role::CaExpert);
    assert!(user.expires_at > Utc::now());
}

#[tokio::test]
async fn test_verify_rejects_expired_token() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let token = token_for(Role::User, Duration::seconds(-30));

    assert!(verifier.verify(&token).await.is_none());
}

#[tokio::test]
async fn test_verify_rejects_wrong_secret() {
    let verifier = JwtVerifier::new("a-different-secret");
    let token = token_for(Role::Admin, Duration::hours(1));

    assert!(verifier.verify(&token).await.is_none());
}

#[tokio::test]
async fn test_verify_rejects_garbage() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    for token in ["", "not-a-jwt", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30."] {
        assert!(verifier.verify(token).await.is_none(), "{token:?}");
    }
}

#[tokio::test]
async fn test_verify_rejects_unknown_role() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let exp = Utc::now().timestamp() + 3600;
    let token = sign_raw(
        json!({ "userId": "u1", "email": "a@b.c", "role": "SUPERUSER", "iat": 0, "exp": exp }),
        TEST_JWT_SECRET,
    );

    assert!(verifier.verify(&token).await.is_none());
}

#[tokio::test]
async fn test_verify_requires_expiry() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let token = sign_raw(
        json!({ "userId": "u1", "email": "a@b.c", "role": "USER", "iat": 0 }),
        TEST_JWT_SECRET,
    );

    assert!(verifier.verify(&token).await.is_none());
}

#[tokio::test]
async fn test_verify_accepts_sub_alias() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let exp = Utc::now().timestamp() + 3600;
    let token = sign_raw(
        json!({ "sub": "u-sub", "email": "a@b.c", "role": "ADMIN", "iat": 0, "exp": exp }),
        TEST_JWT_SECRET,
    );

    let user = verifier.verify(&token).await.expect("sub alias should verify");
    assert_eq!(user.id, "u-sub");
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_verify_prefers_user_id_over_sub() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let exp = Utc::now().timestamp() + 3600;
    let token = sign_raw(
        json!({ "userId": "u-app", "sub": "u-sub", "email": "a@b.c", "role": "USER", "exp": exp }),
        TEST_JWT_SECRET,
    );

    let user = verifier.verify(&token).await.expect("token should verify");
    assert_eq!(user.id, "u-app");
}

#[tokio::test]
async fn test_verify_rejects_missing_subject() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let exp = Utc::now().timestamp() + 3600;
    let token = sign_raw(
        json!({ "email": "a@b.c", "role": "USER", "exp": exp }),
        TEST_JWT_SECRET,
    );

    assert!(verifier.verify(&token).await.is_none());
}

#[test]
fn test_issued_claims_layout() {
    let token = token_for(Role::CaExpert, Duration::minutes(5));

    let data = decode::<serde_json::Value>(
        &token,
        &DecodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        &Validation::default(),
    )
    .unwrap();

    assert_eq!(data.claims["userId"], "user-42");
    assert_eq!(data.claims["email"], "ca@example.com");
    assert_eq!(data.claims["role"], "CA_EXPERT");
    let lifetime = data.claims["exp"].as_i64().unwrap() - data.claims["iat"].as_i64().unwrap();
    assert_eq!(lifetime, 300);
}

// --- Extractor ---

#[tokio::test]
async fn test_extractor_reads_gate_identity() {
    let user = AuthUser {
        id: "user-7".to_string(),
        email: "u7@example.com".to_string(),
        role: Role::User,
        expires_at: Utc::now() + Duration::hours(1),
    };

    let mut parts = get_request_parts();
    parts.extensions.insert(user.clone());

    let extracted = AuthUser::from_request_parts(&mut parts, &()).await;
    assert_eq!(extracted, Ok(user));
}

#[tokio::test]
async fn test_extractor_without_identity_is_unauthorized() {
    let mut parts = get_request_parts();

    let extracted = AuthUser::from_request_parts(&mut parts, &()).await;
    assert_eq!(extracted, Err(ApiError::Unauthorized));
}
