use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use boost_engine::config::Settings;
use boost_engine::core::{BoostEngine, IdentityResolver};
use boost_engine::routes::{self, AppState};
use boost_engine::services::{
    AccountResolver, AnonymousOnly, AppwriteClient, AppwriteCollections, CacheManager, JwtAccountResolver,
    PostgresStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_request".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_request".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(what: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", what, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", what, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    info!("Starting Boost game engine...");

    let settings = Settings::load().map_err(|e| startup_error("Configuration error", e))?;
    let rules = settings.rules().map_err(|e| startup_error("Invalid game settings", e))?;

    info!(
        "Configuration loaded (deck size {}, {} tiers, {} reward entries)",
        rules.deck_size,
        rules.tiers.iter().count(),
        rules.rewards.entries().len()
    );

    // Profile catalog
    let appwrite = AppwriteClient::new(
        settings.appwrite.endpoint.clone(),
        settings.appwrite.api_key.clone(),
        settings.appwrite.project_id.clone(),
        settings.appwrite.database_id.clone(),
        AppwriteCollections {
            profiles: settings.collection.profiles.clone(),
        },
    )
    .map_err(|e| startup_error("Appwrite client error", e))?;

    info!("Appwrite client initialized");

    // Leaderboard cache, falling back to in-process only when Redis is unavailable
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);
    let ttl = settings.leaderboard.ttl_secs;
    let cache = match settings.cache.redis_url.as_deref() {
        Some(url) => match CacheManager::connect(url, l1_cache_size, ttl).await {
            Ok(c) => {
                info!("Cache manager initialized with Redis (L1: {} entries, TTL: {}s)", l1_cache_size, ttl);
                c
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::local(l1_cache_size, ttl)
            }
        },
        None => {
            info!("No Redis configured, using in-process cache (TTL: {}s)", ttl);
            CacheManager::local(l1_cache_size, ttl)
        }
    };

    // Game store
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let store = PostgresStore::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| startup_error("PostgreSQL connection error", e))?;

    info!("PostgreSQL store initialized (max: {} connections)", db_max_conn);

    let accounts: Arc<dyn AccountResolver> = match settings.identity.jwt_secret.as_deref() {
        Some(secret) if !secret.is_empty() => Arc::new(JwtAccountResolver::new(secret)),
        _ => {
            warn!("No JWT secret configured, every visitor is anonymous");
            Arc::new(AnonymousOnly)
        }
    };

    if settings.identity.admin_api_key.is_none() {
        warn!("No admin API key configured, the grant endpoint is disabled");
    }

    let engine = BoostEngine::new(Arc::new(store), Arc::new(appwrite), rules, Arc::new(cache));

    let app_state = AppState {
        engine: Arc::new(engine),
        identities: IdentityResolver::new(settings.identity.network_bucketing),
        accounts,
        admin_key: settings.identity.admin_api_key.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes::<PostgresStore, AppwriteClient>)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
