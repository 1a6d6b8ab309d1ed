// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use haven::{
    api::{self, AppState},
    auth::TokenService,
    config::{LogSettings, Settings},
    store::{MemoryStore, PgStore, Store}
};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

fn init_tracing(settings: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_store(settings: &Settings) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    let Some(url) = &settings.database.url else {
        tracing::warn!("no database configured, using the in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(url)
        .await?;
    let store = PgStore::new(pool);
    if settings.database.run_migrations {
        store.migrate().await?;
        tracing::info!("migrations applied");
    }
    Ok(Arc::new(store))
}

/// Resolve when `listener` fires. A listener that fails to install never
/// resolves, so it cannot trigger a shutdown by itself.
async fn signal_or_pending(listener: impl Future<Output = std::io::Result<()>>, name: &str) {
    if let Err(err) = listener.await {
        tracing::error!(error = %err, signal = name, "failed to install signal handler");
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = signal_or_pending(tokio::signal::ctrl_c(), "ctrl-c");

    #[cfg(unix)]
    let terminate = signal_or_pending(
        async {
            let mut signal =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
            signal.recv().await;
            Ok(())
        },
        "SIGTERM"
    );

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {}
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    init_tracing(&settings.log);

    if settings.auth.is_default_secret() {
        tracing::warn!("using the built-in token secret; set JWT_SECRET or HAVEN__AUTH__SECRET");
    }

    let store = open_store(&settings).await?;
    let state = AppState::new(store, TokenService::from_settings(&settings.auth));
    let app = api::router(state)
        .layer(api::cors_layer(&settings.cors))
        .layer(TraceLayer::new_for_http());

    let addr = settings.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    tracing::info!("OpenAPI document at /api-docs/openapi.json");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
