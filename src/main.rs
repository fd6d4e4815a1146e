use ecocun::config::Config;
use ecocun::gateway::HttpGateway;
use ecocun::services::{markers, LoadOutcome, NotificationSyncEngine, ReportLifecycleStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecocun=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    config.validate()?;
    info!("Syncing against {}", config.api_url);

    let gateway = Arc::new(HttpGateway::new(
        config.api_url.clone(),
        config.request_timeout(),
        config.report_page_limit,
    ));

    let Some(session) = config.session() else {
        warn!("API_TOKEN not set, nothing to synchronize");
        return Ok(());
    };

    // Reports for this viewer
    let store = ReportLifecycleStore::new(gateway.clone(), gateway.clone(), session.clone());
    match store.load(session.role).await {
        Ok(LoadOutcome::Applied { count }) => {
            let placed = store.markers();
            let drawable = markers::renderable(&placed).count();
            info!(
                "{} reports, {} pending, {} markers placeable",
                count,
                store.pending().len(),
                drawable
            );
            for card in store.cards(&config.api_url) {
                info!(
                    "#{} {} [{}] {}",
                    card.folio, card.category_label, card.status, card.location_summary
                );
            }
        }
        Ok(LoadOutcome::Superseded) => {}
        Err(e) if e.is_session_expired() => {
            error!("Session expired, sign in again");
            return Ok(());
        }
        Err(e) => error!("Could not load reports: {}", e),
    }

    // Notification feed
    let engine = NotificationSyncEngine::new(gateway, Some(session), config.poll_interval());
    let mut unread = engine.subscribe_unread();
    let poller = engine.activate();

    tokio::spawn(async move {
        while unread.changed().await.is_ok() {
            let count = *unread.borrow_and_update();
            info!("Unread notifications: {}", count);
        }
    });

    tokio::signal::ctrl_c().await?;
    poller.deactivate();
    info!("Shut down");

    Ok(())
}
