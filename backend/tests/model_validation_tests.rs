use chrono::{TimeZone, Utc};
use filing_gate::{
    auth::Role,
    error::ApiError,
    models::{ErrorBody, SessionInfo},
};
use serde_json::json;

// --- Tests ---

#[test]
fn test_role_wire_names() {
    assert_eq!(serde_json::to_value(Role::User).unwrap(), "USER");
    assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "ADMIN");
    assert_eq!(serde_json::to_value(Role::CaExpert).unwrap(), "CA_EXPERT");

    let parsed: Role = serde_json::from_value(json!("CA_EXPERT")).unwrap();
    assert_eq!(parsed, Role::CaExpert);
    assert!(serde_json::from_value::<Role>(json!("ca_expert")).is_err());

    assert_eq!(Role::CaExpert.to_string(), "CA_EXPERT");
}

#[test]
fn test_session_info_is_camel_case() {
    let info = SessionInfo {
        user_id: "u-1".to_string(),
        email: "a@b.c".to_string(),
        role: Role::User,
        landing_path: "/dashboard".to_string(),
        expires_at: Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap(),
    };

    let value = serde_json::to_value(&info).unwrap();
    assert_eq!(value["userId"], "u-1");
    assert_eq!(value["landingPath"], "/dashboard");
    assert_eq!(value["role"], "USER");
    assert_eq!(value["expiresAt"], "2026-03-31T23:59:59Z");
}

#[test]
fn test_error_bodies() {
    assert_eq!(
        ApiError::Unauthorized.body(),
        ErrorBody {
            error: "Unauthorized".to_string(),
            message: "Authentication required".to_string(),
        }
    );
    assert_eq!(
        serde_json::to_value(ApiError::Forbidden.body()).unwrap(),
        json!({ "error": "Forbidden", "message": "Admin access required" })
    );
    assert_eq!(ApiError::BadGateway.status(), 502);
    assert_eq!(ApiError::PayloadTooLarge.status(), 413);
}
