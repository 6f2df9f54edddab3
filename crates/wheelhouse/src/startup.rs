use crate::{
    api::routes::{
        activate_campaign, claim_prize, complete_condition, complete_game_condition,
        create_campaign, create_store, deactivate_campaign, get_campaign, get_campaign_public,
        get_campaign_winners, get_progress, health, play_campaign,
    },
    config::Settings,
    domain::{CampaignStore, Coordinator, PlayerStore, WinnerExpiryWatcher},
    infra::db::{DBConnection, DatabasePoolConfig, DatabaseType},
};

use anyhow::anyhow;
use axum::{
    body::Body,
    extract::{connect_info::IntoMakeServiceWithConnectInfo, ConnectInfo, Request},
    http::HeaderValue,
    middleware::{self, AddExtension, Next},
    response::IntoResponse,
    routing::{get, post},
    serve::Serve,
    Router,
};
use hyper::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use log::{error, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::{collections::HashMap, net::SocketAddr, str::FromStr};
use std::{sync::Arc, time::Duration};
use tokio::signal::unix::{signal, SignalKind};
use tokio::{net::TcpListener, select, task::JoinHandle};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub struct Application {
    server: Serve<
        TcpListener,
        IntoMakeServiceWithConnectInfo<Router, SocketAddr>,
        AddExtension<Router, ConnectInfo<SocketAddr>>,
    >,
    cancellation_token: CancellationToken,
    background_tasks: TaskTracker,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            config.api_settings.domain, config.api_settings.port
        );
        let listener = SocketAddr::from_str(&address)?;
        let (app_state, background_tasks, cancellation_token) = build_app(config.clone()).await?;
        let server = build_server(listener, app_state, config.api_settings.origins).await?;
        Ok(Self {
            server,
            cancellation_token,
            background_tasks,
        })
    }

    pub async fn run_until_stopped(self) -> Result<(), anyhow::Error> {
        info!("Starting server...");
        match self.server.with_graceful_shutdown(shutdown_signal()).await {
            Ok(_) => {
                info!("Server shutdown initiated");
                self.cancellation_token.cancel();

                let timeout = tokio::time::sleep(std::time::Duration::from_secs(10));
                select! {
                    _ = self.background_tasks.wait() => {
                        info!("Background tasks completed gracefully");
                    }
                    _ = timeout => {
                        warn!("Background tasks timed out during shutdown");
                    }
                }

                info!("Shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!("Server shutdown error: {}", e);
                self.cancellation_token.cancel();

                let _ = tokio::time::timeout(
                    std::time::Duration::from_secs(5),
                    self.background_tasks.wait(),
                )
                .await;

                Err(anyhow!("Error during server shutdown: {}", e))
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub background_threads: Arc<HashMap<String, JoinHandle<()>>>,
}

pub async fn build_app(
    config: Settings,
) -> Result<(AppState, TaskTracker, CancellationToken), anyhow::Error> {
    std::fs::create_dir_all(&config.db_settings.data_folder)
        .map_err(|e| anyhow!("Failed to create data folder: {}", e))?;

    let pool_config: DatabasePoolConfig = config.db_settings.clone().into();

    let campaigns_db = DBConnection::new(
        &config.db_settings.data_folder,
        "campaigns",
        pool_config.clone(),
        DatabaseType::Campaigns,
    )
    .await?;
    let players_db = DBConnection::new(
        &config.db_settings.data_folder,
        "players",
        pool_config,
        DatabaseType::Players,
    )
    .await?;

    let campaign_store = CampaignStore::new(campaigns_db);
    let player_store = PlayerStore::new(players_db);

    let coordinator = Arc::new(Coordinator::new(
        campaign_store,
        player_store,
        ChaCha20Rng::from_os_rng(),
        config.game_settings.claim_code_max_attempts,
    ));

    info!("Coordinator service configured");

    let tracker = TaskTracker::new();
    let mut threads = HashMap::new();
    let cancel_token = CancellationToken::new();

    let expiry_watcher = WinnerExpiryWatcher::new(
        coordinator.clone(),
        cancel_token.clone(),
        Duration::from_secs(config.game_settings.winner_expiry_sweep_secs),
    );
    let expiry_watcher_task = tracker.spawn(async move {
        match expiry_watcher.watch().await {
            Ok(_) => {
                info!("Successfully shutdown winner expiry watcher")
            }
            Err(e) => {
                error!("Error in winner expiry watcher: {}", e)
            }
        }
    });

    tracker.close();
    threads.insert(String::from("winner_expiry_watcher"), expiry_watcher_task);

    let app_state = AppState {
        coordinator,
        background_threads: Arc::new(threads),
    };
    Ok((app_state, tracker, cancel_token))
}

pub async fn build_server(
    socket_addr: SocketAddr,
    app_state: AppState,
    origins: Vec<String>,
) -> Result<
    Serve<
        TcpListener,
        IntoMakeServiceWithConnectInfo<Router, SocketAddr>,
        AddExtension<Router, ConnectInfo<SocketAddr>>,
    >,
    anyhow::Error,
> {
    let listener = TcpListener::bind(socket_addr).await?;

    info!("Setting up service");
    let app = app(app_state, origins);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );
    info!(
        "Service running @: http://{}:{}",
        socket_addr.ip(),
        socket_addr.port()
    );
    Ok(server)
}

pub fn app(app_state: AppState, origins: Vec<String>) -> Router {
    let origins: Vec<HeaderValue> = origins
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true);

    Router::new()
        .route("/api/v1/health_check", get(health))
        .route("/api/v1/stores", post(create_store))
        .route("/api/v1/campaigns", post(create_campaign))
        .route("/api/v1/campaigns/{campaign_id}", get(get_campaign))
        .route(
            "/api/v1/campaigns/{campaign_id}/activate",
            post(activate_campaign),
        )
        .route(
            "/api/v1/campaigns/{campaign_id}/deactivate",
            post(deactivate_campaign),
        )
        .route(
            "/api/v1/campaigns/{campaign_id}/winners",
            get(get_campaign_winners),
        )
        .route(
            "/api/v1/campaigns/{campaign_id}/public",
            get(get_campaign_public),
        )
        .route(
            "/api/v1/campaigns/{campaign_id}/progress",
            get(get_progress),
        )
        .route(
            "/api/v1/campaigns/{campaign_id}/conditions/game/complete",
            post(complete_game_condition),
        )
        .route(
            "/api/v1/campaigns/{campaign_id}/conditions/{condition_id}/complete",
            post(complete_condition),
        )
        .route("/api/v1/campaigns/{campaign_id}/play", post(play_campaign))
        .route("/api/v1/winners/claim", post(claim_prize))
        .layer(middleware::from_fn(log_request))
        .with_state(Arc::new(app_state))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}

async fn shutdown_signal() {
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

    select! {
        _ = sigint.recv() => info!("Received SIGINT signal"),
        _ = sigterm.recv() => info!("Received SIGTERM signal"),
    }
}
