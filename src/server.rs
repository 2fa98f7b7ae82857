//! # Server Module
//!
//! HTTP server setup and route configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::authenticator::Authenticator;
use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::auth::password::PasswordService;
use crate::auth::revocation::{self, RevocationStore};
use crate::config::Config;
use crate::database::DatabaseConnection;
use crate::database::migrations::run_migrations;
use crate::database::revocations::PgRevocationStore;
use crate::database::users::{PgUserRepository, UserRepository};
use crate::envelope::{self, EnvelopeConfig};
use crate::routes::{auth, health, users};


/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: Arc<JwtService>,
    pub authenticator: Arc<Authenticator>,
    pub passwords: Arc<PasswordService>,
    pub users: Arc<dyn UserRepository>,
    pub revocations: Arc<dyn RevocationStore>,
}

impl AppState {
    pub fn new(
        jwt_service: Arc<JwtService>,
        passwords: Arc<PasswordService>,
        users: Arc<dyn UserRepository>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        let authenticator = Arc::new(Authenticator::new(jwt_service.clone(), revocations.clone()));
        Self {
            jwt_service,
            authenticator,
            passwords,
            users,
            revocations,
        }
    }
}

/// Assemble every route. Protected routes sit behind the auth gate; the
/// envelope wraps everything, including the 404 fallback.
pub fn build_router(state: AppState, envelope_config: EnvelopeConfig) -> Router {
    let protected_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/v1/current-user", get(auth::current_user))
        .route("/v1/users", get(users::list_users).post(users::create_user))
        .route(
            "/v1/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            AuthMiddleware::validate_token,
        ));

    let public_routes = Router::new()
        .route("/ping", get(health::ping))
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            envelope_config,
            envelope::intercept,
        ))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}

/// Connect to the database, build the application and serve until shutdown.
pub async fn start(config: Config) -> Result<()> {
    let db = DatabaseConnection::new(&config.database)
        .await
        .context("Failed to connect to the database")?;
    if config.database.run_migrations {
        run_migrations(db.pool()).await?;
    }

    let revocations: Arc<dyn RevocationStore> =
        Arc::new(PgRevocationStore::new(db.pool().clone()));
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db.pool().clone()));
    let state = AppState::new(
        Arc::new(JwtService::new(&config.auth.jwt_secret)),
        Arc::new(PasswordService::default()),
        users,
        revocations.clone(),
    );

    let sweeper = config
        .auth
        .revocation_sweep_interval
        .map(|every| revocation::spawn_sweeper(revocations, every));

    let app = build_router(
        state,
        EnvelopeConfig {
            version: config.api_version.clone(),
        },
    )
    .layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.cors_allowed_origins)),
    );

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("📦 Envelope version: {}", config.api_version);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
