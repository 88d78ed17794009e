mod auth;
mod config;
mod db;
mod error;
mod model;
mod search;
mod state;
mod web_ui;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;
use db::NewUser;
use state::AppState;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qna_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Initialize database
    let db = db::init_database(&config.database_path)
        .await
        .expect("Failed to initialize database");
    tracing::info!("Database initialized at {:?}", config.database_path);

    let search = search::build(&config, db.clone());
    let state = Arc::new(AppState::new(db, config, search));

    state
        .roles()
        .insert_roles()
        .await
        .expect("Failed to seed roles");

    bootstrap_admin(&state).await;

    match state.questions().reindex_all().await {
        Ok(count) => tracing::info!("Indexed {} questions in {}", count, state.search.name()),
        Err(e) => tracing::warn!("Search reindex failed: {}", e),
    }

    spawn_session_cleanup(state.clone());

    let app = Router::new()
        .route("/health", get(health))
        .merge(web_ui::router())
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    let addr = state.config.bind_addr;
    tracing::info!("QnA server starting on http://{}", addr);
    if let Some(email) = &state.config.admin_email {
        tracing::info!("Accounts registered as {} become administrators", email);
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}

async fn health() -> &'static str {
    "ok"
}

/// Create the configured admin account if it does not exist yet.
async fn bootstrap_admin(state: &AppState) {
    let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password) else {
        return;
    };

    let users = state.users();
    match users.find_by_email(email).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let created = users
                .create(NewUser {
                    fullname: "admin".to_string(),
                    email: email.clone(),
                    password: password.clone(),
                    role_id: None,
                })
                .await;
            match created {
                Ok(admin) => tracing::info!("Created admin account {} ({})", email, admin.id),
                Err(e) => tracing::warn!("Could not create admin account {}: {}", email, e),
            }
        }
        Err(e) => tracing::warn!("Admin lookup failed: {}", e),
    }
}

fn spawn_session_cleanup(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = state.sessions.cleanup_expired().await {
                tracing::warn!("Session cleanup failed: {}", e);
            }
        }
    });
}
