mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::{Config, DatabaseType};
use db::{db::DBClient, memory::MemoryStore, Storage};
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use service::{
    auth_service::AuthService, notification_service::NotificationService,
    stats_service::StatsService, ticket_service::TicketService,
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    // Services
    pub auth_service: Arc<AuthService>,
    pub ticket_service: Arc<TicketService>,
    pub notification_service: Arc<NotificationService>,
    pub stats_service: Arc<StatsService>,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, config: Config) -> Self {
        let notification_service = Arc::new(NotificationService::new(
            store.clone(),
            config.enable_notifications,
        ));
        let ticket_service = Arc::new(TicketService::new(
            store.clone(),
            notification_service.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(store.clone()));
        let stats_service = Arc::new(StatsService::new(store));

        Self {
            env: config,
            auth_service,
            ticket_service,
            notification_service,
            stats_service,
        }
    }
}

async fn connect_store(config: &Config) -> Result<Arc<dyn Storage>, String> {
    match config.database_type {
        DatabaseType::Memory => {
            tracing::warn!("using in-memory storage, data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseType::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| "DATABASE_URL must be set".to_string())?;

            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .map_err(|e| format!("failed to connect to the database: {}", e))?;

            tracing::info!("connection to the database is successful");

            let db_client = DBClient::new(pool);
            db_client
                .migrate()
                .await
                .map_err(|e| format!("failed to run migrations: {}", e))?;

            Ok(Arc::new(db_client))
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let store = match connect_store(&config).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("{}", err);
            std::process::exit(1);
        }
    };

    let app_state = Arc::new(AppState::new(store, config.clone()));

    if config.seed_demo_users {
        if let Err(e) = app_state.auth_service.seed_demo_users().await {
            tracing::error!("failed to seed demo users: {}", e);
        }
    }

    let allowed_origins: Vec<HeaderValue> = ["http://localhost:5173", "http://localhost:8000"]
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app = create_router(app_state).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", err);
    }
}
