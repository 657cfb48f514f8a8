//! QRGate - Gate Access Controller
//!
//! Main entry point for the gate controller daemon.

use anyhow::Context;
use qrgate::{
    access_log::AccessLog,
    actuator::{OutputActuator, OutputLine},
    allow_list::{AllowListCache, AllowListStore},
    capture::FrameGrabber,
    decoder::DecoderClient,
    gate_controller::GateController,
    notifier::NotificationDispatcher,
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrgate=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting QRGate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        store_url = %config.redis_url,
        notify_url = %config.notify_url,
        decoder_url = %config.decoder_url,
        video_device = %config.video_device.display(),
        gpio_chip = %config.gpio_chip,
        gpio_line = config.gpio_line,
        simulate_output = config.simulate_output,
        pulse_secs = config.pulse_secs,
        debounce_secs = config.debounce_secs,
        cache_refresh_secs = config.cache_refresh_secs,
        scan_interval_ms = config.scan_interval_ms,
        direction = config.direction.as_str(),
        "Configuration loaded"
    );

    // The capture source is the one dependency we cannot run without.
    let grabber = FrameGrabber::new(config.video_device.clone());
    grabber
        .open()
        .await
        .context("capture source unavailable, refusing to start")?;

    // Remote store + local snapshot cache. The store being down at boot is
    // not fatal: the cache starts empty and the refresh loop recovers.
    let store = Arc::new(AllowListStore::new(
        &config.redis_url,
        &config.key_prefix,
        Duration::from_secs(config.store_timeout_secs),
    )?);
    let cache = Arc::new(AllowListCache::new(store.clone()));
    match cache.refresh().await {
        Ok(count) => tracing::info!(code_count = count, "Initial allow-list loaded"),
        Err(e) => tracing::warn!(
            error = %e,
            "Initial allow-list load failed, starting with empty snapshot"
        ),
    }

    // Gate output
    let line = if config.simulate_output {
        tracing::info!("Output in simulation mode");
        OutputLine::simulated()
    } else {
        OutputLine::gpioset(&config.gpio_chip, config.gpio_line)
    };
    let actuator = Arc::new(OutputActuator::new(
        line,
        Duration::from_secs(config.pulse_secs),
    ));

    // Event reporting + decode adapter
    let notifier = Arc::new(NotificationDispatcher::new(
        config.notify_url.clone(),
        Duration::from_secs(config.notify_timeout_secs),
    ));
    let decoder = Arc::new(DecoderClient::new(config.decoder_url.clone()));
    if !decoder.health_check().await.unwrap_or(false) {
        tracing::warn!(url = %config.decoder_url, "Decode service not reachable at startup");
    }

    let access_log = Arc::new(AccessLog::default());

    let controller = Arc::new(GateController::new(
        grabber,
        decoder.clone(),
        cache.clone(),
        actuator.clone(),
        notifier.clone(),
        access_log.clone(),
        config.direction,
        Duration::from_secs(config.debounce_secs),
        Duration::from_millis(config.scan_interval_ms),
    ));

    // Start snapshot refresh task
    tokio::spawn(
        cache
            .clone()
            .run_refresh_loop(Duration::from_secs(config.cache_refresh_secs)),
    );

    // Start the scan loop
    controller.start().await;
    tracing::info!("Gate controller started");

    // Create application state + router
    let state = AppState {
        config: config.clone(),
        store,
        cache,
        decoder,
        actuator: actuator.clone(),
        access_log,
        controller: controller.clone(),
    };

    let app = web_api::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Termination: stop scanning, then force the output low before exit.
    // In-flight notification dispatches are abandoned.
    controller.stop().await;
    actuator.force_off().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Termination signal received");
}
