mod scheduler;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use campus_api::AppStateInner;
use campus_api::config::AppConfig;
use campus_db::{Database, seed};
use campus_notify::{Mailer, SubscriberStore};

use crate::scheduler::ReminderScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campus=debug,campus_api=debug,campus_db=info,campus_notify=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let config = AppConfig::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    match seed::run(&db, &config.events_fixture) {
        Ok(report) if report.added > 0 || report.rolled_forward > 0 => info!(
            "Seeded events: {} added, {} moved to this year",
            report.added, report.rolled_forward
        ),
        Ok(_) => {}
        Err(e) => warn!("Event seeding failed: {:#}", e),
    }

    let mailer = Arc::new(Mailer::new(&config.smtp)?);
    if !mailer.is_enabled() {
        warn!("EMAIL_USERNAME / EMAIL_PASSWORD not set, emails will not be sent");
    }
    let subscribers = Arc::new(SubscriberStore::new(config.subscribers_path.clone()));

    let reminders = ReminderScheduler::start(
        &config.reminder_cron,
        db.clone(),
        mailer.clone(),
        subscribers.clone(),
    )
    .await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppStateInner::new(config, db, mailer, subscribers)?;

    let app = campus_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Campus events server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reminders.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
