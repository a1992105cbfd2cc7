use actix_web::{http::header, web, HttpRequest, HttpResponse};
use std::sync::Arc;
use validator::Validate;

use crate::core::engine::BoostEngine;
use crate::core::identity::{IdentityResolver, VisitorClaim};
use crate::error::GameError;
use crate::models::{GrantRequest, HealthResponse, LeaderboardQuery, VoteRequest};
use crate::services::auth::AccountResolver;
use crate::services::catalog::ProfileCatalog;
use crate::services::store::GameStore;

pub const FINGERPRINT_HEADER: &str = "X-Device-Fingerprint";
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Application state shared across all handlers
pub struct AppState<S, C> {
    pub engine: Arc<BoostEngine<S, C>>,
    pub identities: IdentityResolver,
    pub accounts: Arc<dyn AccountResolver>,
    pub admin_key: Option<String>,
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            identities: self.identities,
            accounts: self.accounts.clone(),
            admin_key: self.admin_key.clone(),
        }
    }
}

impl<S, C> AppState<S, C> {
    /// Identity key for the caller of `req`
    fn visitor(&self, req: &HttpRequest) -> String {
        let account_id = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.accounts.resolve_account_id(token.trim()));

        let fingerprint = req
            .headers()
            .get(FINGERPRINT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Socket peer only; forwarding headers are caller-controlled
        let remote_addr = req.peer_addr().map(|addr| addr.ip());

        let claim = VisitorClaim {
            account_id,
            fingerprint,
            remote_addr,
        };
        self.identities.resolve(&claim).to_string()
    }

    fn check_admin(&self, req: &HttpRequest) -> Result<(), GameError> {
        let supplied = req.headers().get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok());
        match (&self.admin_key, supplied) {
            (Some(expected), Some(supplied)) if !expected.is_empty() && expected == supplied => Ok(()),
            _ => Err(GameError::Unauthorized),
        }
    }
}

fn invalid(errors: validator::ValidationErrors) -> GameError {
    GameError::InvalidRequest(errors.to_string())
}

/// Configure all boost routes
pub fn configure<S, C>(cfg: &mut web::ServiceConfig)
where
    S: GameStore + 'static,
    C: ProfileCatalog + 'static,
{
    cfg.route("/health", web::get().to(health_check::<S, C>))
        .route("/boost/deck", web::get().to(get_deck::<S, C>))
        .route("/boost/vote", web::post().to(post_vote::<S, C>))
        .route("/boost/leaderboard", web::get().to(get_leaderboard::<S, C>))
        .route("/boost/daily-draw", web::post().to(post_daily_draw::<S, C>))
        .route("/boost/wallet", web::get().to(get_wallet::<S, C>))
        .route("/boost/tiers", web::get().to(get_tiers::<S, C>))
        .route("/boost/admin/grant", web::post().to(post_grant::<S, C>));
}

/// Health check endpoint
async fn health_check<S, C>(state: web::Data<AppState<S, C>>) -> HttpResponse
where
    S: GameStore,
    C: ProfileCatalog,
{
    let healthy = state.engine.health().await.unwrap_or(false);
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/v1/boost/deck
async fn get_deck<S, C>(state: web::Data<AppState<S, C>>, req: HttpRequest) -> Result<HttpResponse, GameError>
where
    S: GameStore,
    C: ProfileCatalog,
{
    let identity = state.visitor(&req);
    let deck = state.engine.deck(&identity).await?;
    Ok(HttpResponse::Ok().json(deck))
}

/// POST /api/v1/boost/vote
///
/// Request body:
/// ```json
/// {
///   "profileId": "string",
///   "roundId": "uuid",
///   "direction": "like",
///   "boostTier": "super"
/// }
/// ```
async fn post_vote<S, C>(
    state: web::Data<AppState<S, C>>,
    body: web::Json<VoteRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, GameError>
where
    S: GameStore,
    C: ProfileCatalog,
{
    body.validate().map_err(invalid)?;

    let identity = state.visitor(&req);
    match state.engine.vote(&identity, &body).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            if e.is_rejection() {
                tracing::info!("Vote by {} on {} rejected: {}", identity, body.profile_id, e);
            }
            Err(e)
        }
    }
}

/// GET /api/v1/boost/leaderboard?window=today&limit=10
async fn get_leaderboard<S, C>(
    state: web::Data<AppState<S, C>>,
    query: web::Query<LeaderboardQuery>,
) -> Result<HttpResponse, GameError>
where
    S: GameStore,
    C: ProfileCatalog,
{
    query.validate().map_err(invalid)?;
    let snapshot = state.engine.leaderboard(query.window, query.limit).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// POST /api/v1/boost/daily-draw
async fn post_daily_draw<S, C>(state: web::Data<AppState<S, C>>, req: HttpRequest) -> Result<HttpResponse, GameError>
where
    S: GameStore,
    C: ProfileCatalog,
{
    let identity = state.visitor(&req);
    let draw = state.engine.daily_draw(&identity).await?;
    Ok(HttpResponse::Ok().json(draw))
}

/// GET /api/v1/boost/wallet
async fn get_wallet<S, C>(state: web::Data<AppState<S, C>>, req: HttpRequest) -> Result<HttpResponse, GameError>
where
    S: GameStore,
    C: ProfileCatalog,
{
    let identity = state.visitor(&req);
    let wallet = state.engine.wallet(&identity).await?;
    Ok(HttpResponse::Ok().json(wallet))
}

/// GET /api/v1/boost/tiers
async fn get_tiers<S, C>(state: web::Data<AppState<S, C>>) -> HttpResponse
where
    S: GameStore,
    C: ProfileCatalog,
{
    HttpResponse::Ok().json(state.engine.tiers())
}

/// POST /api/v1/boost/admin/grant
///
/// Operator-only. Requires the `X-Admin-Key` header.
async fn post_grant<S, C>(
    state: web::Data<AppState<S, C>>,
    body: web::Json<GrantRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, GameError>
where
    S: GameStore,
    C: ProfileCatalog,
{
    state.check_admin(&req)?;
    body.validate().map_err(invalid)?;

    let granted = state.engine.grant(&body.identity, body.amount).await?;
    Ok(HttpResponse::Ok().json(granted))
}
