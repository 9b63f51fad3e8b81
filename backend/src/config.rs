use std::env;

use crate::gate::RouteRules;

/// Fallback signing secret for local development only.
pub const LOCAL_JWT_SECRET: &str = "local-development-secret-change-me";

/// AppConfig
///
/// Immutable process-wide configuration, loaded once at startup and shared
/// with every request through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker.
    pub env: Env,
    // Shared secret the session tokens are signed with.
    pub jwt_secret: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the web application pass-through traffic is forwarded to.
    pub upstream_url: Option<String>,
    // Static route tables driving the access gate.
    pub rules: RouteRules,
}

/// Env
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            upstream_url: None,
            rules: RouteRules::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// In production, panics when `JWT_SECRET` or `UPSTREAM_URL` is missing, so the
    /// gate never starts with a guessable key or nowhere to send traffic.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let upstream_url = env::var("UPSTREAM_URL").ok().filter(|url| !url.is_empty());

        match env {
            Env::Local => Self {
                env: Env::Local,
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                bind_addr,
                upstream_url,
                rules: RouteRules::default(),
            },
            Env::Production => Self {
                env: Env::Production,
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                bind_addr,
                upstream_url: Some(
                    upstream_url.expect("FATAL: UPSTREAM_URL must be set in production."),
                ),
                rules: RouteRules::default(),
            },
        }
    }
}
