use filing_gate::{
    AccessGate, AppState, EchoUpstream, HttpUpstream, UpstreamState,
    auth::{JwtVerifier, VerifierState},
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, builds the access gate and the
/// upstream forwarder, then serves until the process is stopped.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // RUST_LOG wins; otherwise debug for the gate and info for request traces.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "filing_gate=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Access gate starting in {:?} mode", config.env);

    let verifier = Arc::new(JwtVerifier::new(&config.jwt_secret)) as VerifierState;
    let gate = Arc::new(AccessGate::new(config.rules.clone(), verifier));

    let upstream = match &config.upstream_url {
        Some(url) => {
            tracing::info!(upstream = %url, "Forwarding pass-through traffic");
            Arc::new(
                HttpUpstream::new(url).expect("FATAL: Failed to build the upstream HTTP client."),
            ) as UpstreamState
        }
        None => {
            tracing::warn!("UPSTREAM_URL not set; answering pass-through traffic with the echo upstream");
            Arc::new(EchoUpstream::new()) as UpstreamState
        }
    };

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        gate,
        upstream,
        config,
    });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the listen address. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
