use eventbot::{
    attendance::{start_control_sweep, SweepConfig},
    router, AppState, BotConfig, GatewayTransport, JsonFileEventStore,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventbot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::load()?;

    info!(
        bot_name = %config.bot_name,
        event_channel = %config.event_channel_id,
        state_file = %config.state_file.display(),
        "Starting event bot"
    );

    let store = Arc::new(JsonFileEventStore::new(config.state_file.clone()));
    let gateway = GatewayTransport::default();
    let app_state = AppState::wire(&config, store, Arc::new(gateway.clone()), gateway);

    if let Some(control_ttl) = config.control_ttl() {
        tokio::spawn(start_control_sweep(
            Arc::clone(&app_state.attendance),
            SweepConfig {
                sweep_interval: config.sweep_interval(),
                control_ttl,
            },
        ));
    }

    let app = router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(listen_addr = %config.listen_addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
