use std::sync::Arc;

use axum::http::{HeaderMap, header};

use crate::{
    auth::{AuthUser, Role, SESSION_COOKIE, VerifierState},
    error::ApiError,
};

/// RouteRules
///
/// The static routing tables the gate classifies paths with. Built once at
/// startup (see `AppConfig`) and never mutated afterwards; every lookup is a
/// plain string-prefix match evaluated in declaration order.
#[derive(Debug, Clone)]
pub struct RouteRules {
    /// Framework and static asset prefixes that bypass the gate entirely.
    pub asset_prefixes: Vec<String>,
    /// Page prefixes that require a session.
    pub protected_prefixes: Vec<String>,
    /// Prefix → roles allowed under it. The first declared matching prefix wins.
    pub role_rules: Vec<(String, Vec<Role>)>,
    /// Login/register style pages an authenticated caller is moved away from.
    pub auth_only_prefixes: Vec<String>,
    pub api_prefix: String,
    pub admin_api_prefix: String,
    /// API prefixes reachable without a session.
    pub public_api_prefixes: Vec<String>,
    pub login_path: String,
    pub callback_param: String,
    pub admin_landing: String,
    pub ca_expert_landing: String,
    pub user_landing: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            asset_prefixes: owned(&["/_next", "/static"]),
            protected_prefixes: owned(&[
                "/dashboard",
                "/admin",
                "/ca-portal",
                "/profile",
                "/settings",
            ]),
            role_rules: vec![
                ("/admin".to_string(), vec![Role::Admin]),
                ("/ca-portal".to_string(), vec![Role::CaExpert, Role::Admin]),
                (
                    "/dashboard".to_string(),
                    vec![Role::User, Role::Admin, Role::CaExpert],
                ),
            ],
            auth_only_prefixes: owned(&[
                "/login",
                "/register",
                "/forgot-password",
                "/reset-password",
            ]),
            api_prefix: "/api/".to_string(),
            admin_api_prefix: "/api/admin".to_string(),
            public_api_prefixes: owned(&[
                "/api/auth/login",
                "/api/auth/register",
                "/api/auth/forgot-password",
                "/api/auth/reset-password",
                "/api/auth/verify-email",
                "/api/auth/resend-verification",
                "/api/contact",
            ]),
            login_path: "/login".to_string(),
            callback_param: "callbackUrl".to_string(),
            admin_landing: "/admin/dashboard".to_string(),
            ca_expert_landing: "/ca-portal/dashboard".to_string(),
            user_landing: "/dashboard".to_string(),
        }
    }
}

/// RouteClass
///
/// The one category a path falls into. `classify` is total: every path maps to
/// exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass<'a> {
    /// Dot segments or backslashes: the path the application would resolve is
    /// not the path the gate sees.
    Malformed,
    Asset,
    Protected,
    RoleRestricted(&'a [Role]),
    AuthOnly,
    Api { admin: bool },
    PublicApi,
    Public,
}

/// is_malformed
///
/// True when any segment is `.` or `..` (raw or percent-encoded) or the path
/// contains a backslash. URL resolution downstream would collapse such a path
/// into a different one than the gate classified.
pub fn is_malformed(path: &str) -> bool {
    if path.contains('\\') {
        return true;
    }

    path.split('/').any(|segment| match urlencoding::decode(segment) {
        Ok(decoded) => decoded == "." || decoded == ".." || decoded.contains('\\'),
        Err(_) => true,
    })
}

fn any_prefix(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

impl RouteRules {
    /// classify
    ///
    /// Priority order: malformed, asset, protected page, auth-only page, API, public.
    pub fn classify(&self, path: &str) -> RouteClass<'_> {
        if is_malformed(path) {
            return RouteClass::Malformed;
        }

        if self.is_asset(path) {
            return RouteClass::Asset;
        }

        if any_prefix(&self.protected_prefixes, path) {
            return match self.allowed_roles(path) {
                Some(roles) => RouteClass::RoleRestricted(roles),
                None => RouteClass::Protected,
            };
        }

        if any_prefix(&self.auth_only_prefixes, path) {
            return RouteClass::AuthOnly;
        }

        if path.starts_with(self.api_prefix.as_str()) {
            if any_prefix(&self.public_api_prefixes, path) {
                return RouteClass::PublicApi;
            }
            return RouteClass::Api {
                admin: path.starts_with(self.admin_api_prefix.as_str()),
            };
        }

        RouteClass::Public
    }

    /// A path is an asset when it sits under an asset prefix or when its last
    /// segment carries a file extension. Dot-only segments (`.`/`..`) are not
    /// extensions.
    pub fn is_asset(&self, path: &str) -> bool {
        if any_prefix(&self.asset_prefixes, path) {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or("");
        last_segment.contains('.') && !last_segment.chars().all(|c| c == '.')
    }

    fn allowed_roles(&self, path: &str) -> Option<&[Role]> {
        self.role_rules
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, roles)| roles.as_slice())
    }

    /// landing_path
    ///
    /// Home area of a role. Used both after an auth-only page is hit with a
    /// live session and when a role is refused a restricted prefix.
    pub fn landing_path(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin_landing,
            Role::CaExpert => &self.ca_expert_landing,
            Role::User => &self.user_landing,
        }
    }

    /// Login location carrying the originally requested path as the callback.
    pub fn login_redirect(&self, path: &str) -> String {
        format!(
            "{}?{}={}",
            self.login_path,
            self.callback_param,
            urlencoding::encode(path)
        )
    }
}

/// Decision
///
/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Forward the request. `identity` is set on protected pages and APIs and
    /// must be propagated downstream.
    Pass { identity: Option<AuthUser> },
    /// Relocate the client to this path.
    Redirect(String),
    /// Answer directly with the structured error.
    Reject(ApiError),
}

impl Decision {
    fn pass() -> Self {
        Decision::Pass { identity: None }
    }
}

/// evaluate
///
/// The gate's decision table. Pure: the same rules, path and identity always
/// produce the same decision. `user` is `None` for both a missing and an
/// unverifiable token.
pub fn evaluate(rules: &RouteRules, path: &str, user: Option<&AuthUser>) -> Decision {
    let class = rules.classify(path);
    match class {
        RouteClass::Malformed => Decision::Reject(ApiError::BadRequest),

        RouteClass::Asset | RouteClass::Public | RouteClass::PublicApi => Decision::pass(),

        RouteClass::Protected | RouteClass::RoleRestricted(_) => {
            let Some(user) = user else {
                return Decision::Redirect(rules.login_redirect(path));
            };

            if let RouteClass::RoleRestricted(roles) = class {
                if !roles.contains(&user.role) {
                    return Decision::Redirect(rules.landing_path(user.role).to_string());
                }
            }

            Decision::Pass {
                identity: Some(user.clone()),
            }
        }

        RouteClass::AuthOnly => match user {
            Some(user) => Decision::Redirect(rules.landing_path(user.role).to_string()),
            None => Decision::pass(),
        },

        RouteClass::Api { admin } => match user {
            None => Decision::Reject(ApiError::Unauthorized),
            Some(user) if admin && user.role != Role::Admin => {
                Decision::Reject(ApiError::Forbidden)
            }
            Some(user) => Decision::Pass {
                identity: Some(user.clone()),
            },
        },
    }
}

/// AccessGate
///
/// Route rules plus the token verifier. One instance is shared by every request;
/// it holds no mutable state.
pub struct AccessGate {
    rules: RouteRules,
    verifier: VerifierState,
}

pub type GateState = Arc<AccessGate>;

impl AccessGate {
    pub fn new(rules: RouteRules, verifier: VerifierState) -> Self {
        Self { rules, verifier }
    }

    pub fn rules(&self) -> &RouteRules {
        &self.rules
    }

    /// decide
    ///
    /// Malformed paths are refused and assets pass, both before any
    /// verification. Otherwise the token (if any) is verified first and the
    /// result fed to [`evaluate`].
    pub async fn decide(&self, path: &str, token: Option<&str>) -> Decision {
        if is_malformed(path) {
            return Decision::Reject(ApiError::BadRequest);
        }

        if self.rules.is_asset(path) {
            return Decision::pass();
        }

        let user = match token {
            Some(token) => self.verifier.verify(token).await,
            None => None,
        };

        evaluate(&self.rules, path, user.as_ref())
    }
}

/// session_token
///
/// Pulls the session token out of the `Cookie` header(s). The first non-empty
/// `auth-token` pair wins; one surrounding pair of double quotes is removed.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| unquote(value))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}
