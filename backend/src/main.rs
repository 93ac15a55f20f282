use dotenvy::dotenv;
use anyhow::Context;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use std::sync::Arc;

mod handlers {
    pub mod contact_handlers;
    pub mod contact_dtos;
}
mod api {
    pub mod mail_relay;
}
mod models {
    pub mod contact_models;
}
mod config {
    pub mod app_config;
}
mod utils {
    pub mod html;
}

use api::mail_relay::{self, MailRelay};
use config::app_config::AppConfig;
use handlers::contact_handlers;

async fn health_check() -> &'static str {
    "OK"
}

pub struct AppState {
    config: AppConfig,
    mail_relay: Arc<dyn MailRelay>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_TYPE]);
    let cors = match &state.config.allowed_origin {
        Some(origin) => cors.allow_origin(origin.clone()),
        None => cors.allow_origin(Any),
    };

    let mut app = Router::new()
        .route("/api/health", get(health_check))
        .route(
            "/api/contact",
            post(contact_handlers::submit_contact)
                .fallback(contact_handlers::method_not_allowed),
        );

    if let Some(dir) = &state.config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
    .layer(cors)
    // Outside the CORS layer, which would otherwise answer every OPTIONS.
    .layer(middleware::from_fn(contact_handlers::reject_plain_options))
    .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let _guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((dsn, sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        }))
    });

    let mail_relay = mail_relay::build_relay(&config.relay)
        .context("Failed to set up mail relay")?;

    let bind_address = config.bind_address;
    if let Some(dir) = &config.static_dir {
        info!(dir = %dir.display(), "Serving static site");
    }

    let state = Arc::new(AppState {
        config,
        mail_relay,
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!(address = %bind_address, "Contact relay listening");
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}
