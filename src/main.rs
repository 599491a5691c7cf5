// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use relational_auth_server::{
    api::router,
    auth::TokenVerifier,
    backend::Backend,
    config::{init_tracing, Settings},
    state::AppState,
    storage::RedbStorage,
    tidy::LeaseTidier,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format);

    let db_path = settings.database_path();
    let storage = RedbStorage::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "Opened database");

    let backend = Backend::new(Arc::new(storage), token_verifier())
        .with_system_view(settings.system);

    if let Some(seed) = &settings.seed_config {
        if backend.config()?.is_none() {
            backend.write_config(seed)?;
            tracing::info!(issuer = %seed.issuer, "Seeded backend configuration from environment");
        }
    }
    if backend.config()?.is_none() {
        tracing::warn!("Backend not configured; logins fail until POST /v1/config");
    }

    let mut state = AppState::new(backend);
    match settings.operator.clone() {
        Some(credential) => state = state.with_operator(credential),
        None => tracing::warn!("ADMIN_TOKEN not set; role and config routes are disabled"),
    }

    let shutdown = CancellationToken::new();
    let tidier = tokio::spawn(LeaseTidier::new(state.backend.clone()).run(shutdown.clone()));

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!(addr = %settings.bind_addr, "Relational Auth listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = tidier.await {
        tracing::error!(error = %e, "Lease tidier task failed");
    }

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(not(feature = "dev"))]
fn token_verifier() -> Arc<dyn TokenVerifier> {
    Arc::new(relational_auth_server::auth::JwksVerifier::new())
}

#[cfg(feature = "dev")]
fn token_verifier() -> Arc<dyn TokenVerifier> {
    tracing::warn!("DEV BUILD: token signatures are NOT verified");
    Arc::new(relational_auth_server::auth::InsecureVerifier)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
