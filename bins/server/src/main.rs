//! Local Fishing API Server
//!
//! Main entry point for the inventory and sales backend.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use localfish_api::{AppState, create_router};
use localfish_core::storage::{CloudinaryConfig, MediaStorage};
use localfish_db::ConnectionCache;
use localfish_shared::config::{CloudinarySettings, JwtSettings, LogFormat};
use localfish_shared::{AppConfig, EmailService, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.server.log_format);

    // No connection is opened until the first request needs one
    let db = ConnectionCache::new(&config.database);

    let jwt_service = JwtService::new(jwt_config(&config.jwt));

    let email_service = EmailService::new(config.email.clone());
    if email_service.is_enabled() {
        info!(
            smtp_host = %config.email.smtp_host,
            smtp_port = %config.email.smtp_port,
            "Email service configured"
        );
    } else {
        info!("Email disabled; worker invitations are logged only");
    }

    let media = match &config.cloudinary {
        Some(settings) => {
            let storage = MediaStorage::new(cloudinary_config(settings))
                .context("Invalid Cloudinary configuration")?;
            info!(cloud = %settings.cloud_name, folder = %settings.folder, "Media storage configured");
            Some(Arc::new(storage))
        }
        None => {
            warn!("Cloudinary not configured; uploads are disabled");
            None
        }
    };

    let state = AppState {
        db,
        jwt_service: Arc::new(jwt_service),
        email_service: Arc::new(email_service),
        media,
    };

    let body_limit = config.server.body_limit_bytes;
    let app = create_router(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, body_limit, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "localfish=debug,localfish_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[allow(clippy::cast_possible_wrap)]
fn jwt_config(settings: &JwtSettings) -> JwtConfig {
    JwtConfig {
        secret: settings.secret.clone(),
        access_token_expires_secs: settings.access_token_expiry_secs as i64,
        refresh_token_expires_secs: settings.refresh_token_expiry_secs as i64,
    }
}

fn cloudinary_config(settings: &CloudinarySettings) -> CloudinaryConfig {
    CloudinaryConfig::new(
        settings.cloud_name.clone(),
        settings.api_key.clone(),
        settings.api_secret.clone(),
    )
    .with_folder(settings.folder.clone())
    .with_max_file_size(settings.max_file_size)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
