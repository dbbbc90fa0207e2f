// Framework bootstrap for the arena server runtime.

use crate::domain::tuning::RoomTuning;
use crate::frameworks::config;
use crate::interface_adapters::clients::platform::PlatformClient;
use crate::interface_adapters::net::client::ws_handler;
use crate::interface_adapters::net::internal::{healthz_handler, platform_event_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RegistrySettings, RoomRegistry, RoomSettings};

use axum::{
    Router,
    routing::{get, post},
};
use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state()?;

    // Best-effort: surface platform connectivity at startup without
    // blocking or failing the boot.
    let platform = state.platform.clone();
    tokio::spawn(async move {
        match platform.fetch_catalog().await {
            Ok(catalog) => tracing::info!(entries = catalog.len(), "platform catalog reachable"),
            Err(err) => tracing::warn!(error = ?err, "platform catalog unavailable"),
        }
    });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/platform/events", post(platform_event_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Result<AppState> {
    let platform_base_url = config::platform_service_url();
    let platform_request_timeout = config::platform_request_timeout();
    let platform = PlatformClient::new(platform_base_url.clone(), platform_request_timeout)
        .map_err(|e| std::io::Error::other(format!("failed to initialize platform client: {e}")))?;
    tracing::debug!(
        platform_base_url = %platform_base_url,
        platform_request_timeout_ms = platform_request_timeout.as_millis(),
        "platform client configured"
    );

    let tuning = RoomTuning::default();

    // The registry owns the set of active room tasks.
    let registry = Arc::new(RoomRegistry::new(RegistrySettings {
        event_channel_capacity: config::EVENT_CHANNEL_CAPACITY,
        broadcast_capacity: config::BROADCAST_CAPACITY,
        room_code_len: config::ROOM_CODE_LEN,
        tuning,
        room: RoomSettings::default(),
    }));

    Ok(AppState {
        registry,
        platform: Arc::new(platform),
        tuning,
    })
}
