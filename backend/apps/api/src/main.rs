//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use axum::{
    Router, http,
    http::{Method, header},
};
use identity::config::IdentityConfig;
use identity::infra::{HttpProviderGateway, PgIdentityRepository, ProviderSettings, SmtpMailer};
use identity::models::provider_link::OAuthProvider;
use identity::router::identity_router;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,identity=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired sessions and codes.
    // Errors here should not prevent server startup.
    let repo = PgIdentityRepository::new(pool.clone());
    match repo.cleanup_expired_all().await {
        Ok((sessions, codes)) => {
            tracing::info!(
                sessions_deleted = sessions,
                codes_deleted = codes,
                "Identity cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Identity cleanup failed, continuing anyway"
            );
        }
    }

    // Identity configuration
    let mut config = if cfg!(debug_assertions) {
        IdentityConfig::development()
    } else {
        // In production, load secrets from environment
        IdentityConfig {
            access_token_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set in production"),
            refresh_token_secret: env::var("JWT_REFRESH_SECRET")
                .expect("JWT_REFRESH_SECRET must be set in production"),
            ..IdentityConfig::default()
        }
    };

    if let Ok(frontend_url) = env::var("FRONTEND_URL") {
        config.frontend_url = frontend_url;
    }

    if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }

    // Outgoing mail
    let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string());
    let smtp_username = env::var("SMTP_USERNAME").unwrap_or_default();
    let smtp_password = env::var("SMTP_PASSWORD").unwrap_or_default();
    let mailer_sender =
        env::var("MAILER_SENDER").unwrap_or_else(|_| "Worklane <no-reply@worklane.dev>".to_string());

    let mailer = SmtpMailer::new(&smtp_host, smtp_username, smtp_password, &mailer_sender)
        .map_err(|e| anyhow::anyhow!("SMTP setup failed: {e}"))?;

    // OAuth providers: only registered when credentials are configured
    let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());

    let mut oauth = HttpProviderGateway::new();
    if let (Ok(client_id), Ok(client_secret)) = (
        env::var("GOOGLE_CLIENT_ID"),
        env::var("GOOGLE_CLIENT_SECRET"),
    ) {
        oauth.register(
            OAuthProvider::Google,
            ProviderSettings {
                client_id,
                client_secret,
                redirect_uri: format!("{base_url}/api/v1/auth/oauth/google/callback"),
            },
        );
        tracing::info!("Google OAuth enabled");
    }
    if let (Ok(client_id), Ok(client_secret)) = (
        env::var("LINKEDIN_CLIENT_ID"),
        env::var("LINKEDIN_CLIENT_SECRET"),
    ) {
        oauth.register(
            OAuthProvider::LinkedIn,
            ProviderSettings {
                client_id,
                client_secret,
                redirect_uri: format!("{base_url}/api/v1/auth/oauth/linkedin/callback"),
            },
        );
        tracing::info!("LinkedIn OAuth enabled");
    }

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/v1", identity_router(repo, mailer, oauth, config))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
