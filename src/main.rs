//! Matching service entry point.

use anyhow::Context;
use matching_service::{Application, Repositories, Settings, telemetry};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    telemetry::init(&settings.logging)
        .map_err(|e| anyhow::anyhow!(e))
        .context("initializing logging")?;

    let repos = match settings.database.url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            let pool = PgPoolOptions::new()
                .max_connections(settings.database.max_connections)
                .connect(url)
                .await
                .context("connecting to PostgreSQL")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("running migrations")?;
            info!("using PostgreSQL for quotes, invitations and webhook events");
            Repositories::postgres(pool)
        }
        _ => {
            info!("no database configured, using in-memory storage");
            Repositories::in_memory()
        }
    };

    let app = Application::build(&settings, repos).context("building integrations")?;

    let reconciler = app.reconciler.clone();
    tokio::spawn(async move {
        let report = reconciler.reconcile().await;
        info!(
            subscribed = report.subscribed.len(),
            already_present = report.already_present.len(),
            absorbed = report.absorbed.len(),
            failed = report.failed.len(),
            "subscription reconciliation finished"
        );
    });

    let addr = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "matching service listening");

    axum::serve(listener, app.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
