use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::auth::Role;

/// ErrorBody
///
/// The structured rejection payload returned for API requests: `{ error, message }`.
/// Shared with the web client through the generated TypeScript binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// SessionInfo
///
/// Response of `GET /api/me`: the identity the gate verified for this request,
/// plus the landing path the client should use for its home link.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionInfo {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub landing_path: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// LogoutResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}
