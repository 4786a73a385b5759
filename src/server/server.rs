use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use crate::badges::{find_requirement, BadgeProgress, BadgeType};
use crate::catalog_store::{validation::validate_new_model, Model, ModelCategory, NewModel};
use crate::identity::IdentityVerifier;
use crate::recommendation::Audience;
use crate::user::{EarnedBadge, UserFavorite, UserProfile};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::error::*;
use super::metrics;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerStats {
    pub uptime: String,
    pub user_id: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Deserialize, Debug, Default)]
struct ModelsQuery {
    pub category: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
struct RecommendationsQuery {
    pub limit: Option<i64>,
    /// Compact "recommended for you" panel, with its smaller default limit.
    #[serde(default)]
    pub compact: bool,
}

#[derive(Deserialize, Debug, Default)]
struct AccessibleQuery {
    pub audience: Option<String>,
    pub limit: Option<i64>,
}

fn default_true() -> bool {
    true
}

/// Outcome of an invocation the client performed against an AI provider.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UsageReport {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl Default for UsageReport {
    fn default() -> Self {
        UsageReport {
            success: true,
            error: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UsageResponse {
    model_id: u64,
    usage_count: u64,
    badges: Option<BadgeProgress>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BadgeProgressBody {
    pub badge_type: Option<String>,
    pub increment: Option<i64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EarnBadgeBody {
    pub badge_type: Option<String>,
    pub level: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EarnBadgeResponse {
    success: bool,
    already_earned: bool,
    badge: EarnedBadge,
}

#[derive(Serialize)]
struct BadgesResponse {
    success: bool,
    badges: BadgeProgress,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AddFavoriteBody {
    pub model_id: u64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SignInBody {
    pub id_token: String,
}

#[derive(Serialize)]
struct SignInResponse {
    token: String,
    user: UserProfile,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SetActiveBody {
    pub is_active: bool,
}

// =============================================================================
// Parsing helpers
// =============================================================================

fn parse_model_id(raw: &str) -> ApiResult<u64> {
    raw.parse::<u64>()
        .map_err(|_| ApiError::invalid(MSG_INVALID_MODEL_ID))
}

fn parse_category(raw: &str) -> ApiResult<ModelCategory> {
    ModelCategory::from_db_str(raw).ok_or_else(|| ApiError::invalid(MSG_INVALID_CATEGORY))
}

fn parse_badge_type(raw: Option<&str>, missing_message: &str) -> ApiResult<BadgeType> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Err(ApiError::invalid(missing_message)),
        Some(raw) => BadgeType::from_db_str(raw).ok_or_else(|| ApiError::invalid(MSG_UNKNOWN_BADGE)),
    }
}

/// Non-positive limits yield an empty result rather than an error.
fn effective_limit(limit: Option<i64>, default: usize) -> usize {
    match limit {
        None => default,
        Some(n) if n <= 0 => 0,
        Some(n) => n as usize,
    }
}

fn query_or_400<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(q)| q)
        .map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))
}

fn json_or_400<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(b)| b).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        ApiError::invalid(MSG_INVALID_BODY)
    })
}

fn fetch_models_failed(err: anyhow::Error) -> ApiError {
    ApiError::internal(MSG_MODELS_FETCH_FAILED, err)
}

/// Only the owner of `user_id` may change its badges.
fn require_owner(session: &Session, user_id: &str) -> ApiResult<()> {
    if session.user_id == user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(MSG_FORBIDDEN))
    }
}

fn require_admin(session: &Session, config: &ServerConfig) -> ApiResult<()> {
    if config.is_admin(&session.user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(MSG_FORBIDDEN))
    }
}

// =============================================================================
// Home
// =============================================================================

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        user_id: session.map(|s| s.user_id),
    };
    Json(stats)
}

// =============================================================================
// Models
// =============================================================================

async fn list_models(
    State(catalog_store): State<GuardedCatalogStore>,
    query: Result<Query<ModelsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Model>>> {
    let query = query_or_400(query)?;
    let models = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(raw) => catalog_store
            .get_models_by_category(parse_category(raw)?)
            .map_err(fetch_models_failed)?,
        None => catalog_store.list_models().map_err(fetch_models_failed)?,
    };
    Ok(Json(models))
}

async fn get_models_by_category(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<Model>>> {
    let category = parse_category(&category)?;
    Ok(Json(
        catalog_store
            .get_models_by_category(category)
            .map_err(fetch_models_failed)?,
    ))
}

/// Viewing a model counts as a global usage.
async fn get_model(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<Model>> {
    let id = parse_model_id(&id)?;
    let mut model = match catalog_store.get_model(id)? {
        Some(model) if model.is_active => model,
        _ => return Err(ApiError::NotFound(MSG_MODEL_NOT_FOUND)),
    };
    match catalog_store.increment_usage_count(id)? {
        Some(usage_count) => model.usage_count = usage_count,
        None => return Err(ApiError::NotFound(MSG_MODEL_NOT_FOUND)),
    }
    Ok(Json(model))
}

async fn get_similar_models(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Model>>> {
    let id = parse_model_id(&id)?;
    let limit = effective_limit(
        query_or_400(query)?.limit,
        state.config.recommendations.similar_limit,
    );
    match state.user_manager.similar_models(id, limit)? {
        Some(models) => {
            metrics::record_recommendations_served("similar");
            Ok(Json(models))
        }
        None => Err(ApiError::NotFound(MSG_MODEL_NOT_FOUND)),
    }
}

/// Records a completed invocation. A failed invocation is reported back as
/// an upstream failure and leaves every counter untouched.
async fn record_model_usage(
    State(user_manager): State<GuardedUserManager>,
    session: Option<Session>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<UsageResponse>> {
    let id = parse_model_id(&id)?;
    let report: UsageReport = if body.is_empty() {
        UsageReport::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| ApiError::invalid(MSG_INVALID_BODY))?
    };

    if !report.success {
        warn!(
            "Invocation of model {} failed: {}",
            id,
            report.error.as_deref().unwrap_or("no details")
        );
        return Err(ApiError::UpstreamProvider(MSG_TRY_ANOTHER_MODEL));
    }

    let user_id = session.as_ref().map(|s| s.user_id.as_str());
    let outcome = user_manager
        .record_model_usage(user_id, id)?
        .ok_or(ApiError::NotFound(MSG_MODEL_NOT_FOUND))?;

    metrics::record_model_invocation(outcome.category.to_db_str(), outcome.activity.is_some());
    Ok(Json(UsageResponse {
        model_id: outcome.model_id,
        usage_count: outcome.usage_count,
        badges: outcome.activity.map(|a| a.badge_progress),
    }))
}

// =============================================================================
// Recommendations
// =============================================================================

async fn get_recommendations(
    State(state): State<ServerState>,
    session: Option<Session>,
    query: Result<Query<RecommendationsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Model>>> {
    let query = query_or_400(query)?;
    let default_limit = if query.compact {
        state.config.recommendations.panel_limit
    } else {
        state.config.recommendations.default_limit
    };
    let limit = effective_limit(query.limit, default_limit);
    let user_id = session.as_ref().map(|s| s.user_id.as_str());
    let recommendations = state
        .user_manager
        .recommendations_for(user_id, limit)
        .map_err(fetch_models_failed)?;
    metrics::record_recommendations_served(if recommendations.personalized {
        "personalized"
    } else {
        "popular"
    });
    Ok(Json(recommendations.models))
}

async fn get_accessible_recommendations(
    State(state): State<ServerState>,
    query: Result<Query<AccessibleQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Model>>> {
    let query = query_or_400(query)?;
    let audience = query
        .audience
        .as_deref()
        .and_then(Audience::from_query)
        .ok_or_else(|| ApiError::invalid(MSG_INVALID_AUDIENCE))?;
    let limit = effective_limit(query.limit, state.config.recommendations.accessible_limit);
    let models = state
        .user_manager
        .accessible_models(audience, limit, state.config.audience_matching)
        .map_err(fetch_models_failed)?;
    metrics::record_recommendations_served("accessible");
    Ok(Json(models))
}

// =============================================================================
// Badges
// =============================================================================

async fn get_user_badges(
    State(user_manager): State<GuardedUserManager>,
    Path(user_id): Path<String>,
) -> ApiResult<Response> {
    let progress = user_manager
        .badge_progress(&user_id)?
        .ok_or(ApiError::NotFound(MSG_USER_NOT_FOUND))?;
    Ok(Json(serde_json::json!({ "badges": progress })).into_response())
}

async fn get_user_badge_status(
    State(user_manager): State<GuardedUserManager>,
    Path(user_id): Path<String>,
) -> ApiResult<Response> {
    let summary = user_manager
        .badge_summary(&user_id)?
        .ok_or(ApiError::NotFound(MSG_USER_NOT_FOUND))?;
    Ok(Json(summary).into_response())
}

async fn get_user_earned_badges(
    State(user_manager): State<GuardedUserManager>,
    Path(user_id): Path<String>,
) -> ApiResult<Response> {
    let badges = user_manager
        .earned_badges(&user_id)?
        .ok_or(ApiError::NotFound(MSG_USER_NOT_FOUND))?;
    Ok(Json(serde_json::json!({ "badges": badges })).into_response())
}

async fn post_badge_progress(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
    Path(user_id): Path<String>,
    body: Result<Json<BadgeProgressBody>, JsonRejection>,
) -> ApiResult<Json<BadgesResponse>> {
    require_owner(&session, &user_id)?;
    let body = json_or_400(body)?;
    let badge_type = parse_badge_type(body.badge_type.as_deref(), MSG_MISSING_BADGE_TYPE)?;
    let increment = match body.increment {
        None => 1,
        Some(n) if n >= 1 => n as u64,
        Some(_) => return Err(ApiError::invalid(MSG_INVALID_BODY)),
    };

    let badges = user_manager
        .increment_badge_progress(&user_id, badge_type, increment)?
        .ok_or(ApiError::NotFound(MSG_USER_NOT_FOUND))?;
    metrics::record_badge_progress_increment(badge_type.to_db_str());
    Ok(Json(BadgesResponse {
        success: true,
        badges,
    }))
}

async fn post_earn_badge(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
    Path(user_id): Path<String>,
    body: Result<Json<EarnBadgeBody>, JsonRejection>,
) -> ApiResult<Json<EarnBadgeResponse>> {
    require_owner(&session, &user_id)?;
    let body = json_or_400(body)?;
    let badge_type =
        parse_badge_type(body.badge_type.as_deref(), MSG_MISSING_BADGE_TYPE_OR_LEVEL)?;
    let level = match body.level {
        Some(level) if level > 0 => level,
        _ => return Err(ApiError::invalid(MSG_MISSING_BADGE_TYPE_OR_LEVEL)),
    };
    if find_requirement(badge_type, level).is_none() {
        return Err(ApiError::invalid(MSG_UNKNOWN_BADGE));
    }

    let (badge, already_earned) = user_manager
        .earn_badge(&user_id, badge_type, level)?
        .ok_or(ApiError::NotFound(MSG_USER_NOT_FOUND))?;
    if !already_earned {
        info!("User {} earned badge {} level {}", user_id, badge_type, level);
        metrics::record_badge_earned(badge_type.to_db_str());
    }
    Ok(Json(EarnBadgeResponse {
        success: true,
        already_earned,
        badge,
    }))
}

// =============================================================================
// Favorites
// =============================================================================

async fn get_favorites(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
) -> ApiResult<Json<Vec<Model>>> {
    Ok(Json(
        user_manager
            .favorite_models(&session.user_id)
            .map_err(fetch_models_failed)?,
    ))
}

async fn add_favorite(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
    body: Result<Json<AddFavoriteBody>, JsonRejection>,
) -> ApiResult<Json<UserFavorite>> {
    let body = json_or_400(body)?;
    let favorite = user_manager
        .add_favorite(&session.user_id, body.model_id)?
        .ok_or(ApiError::NotFound(MSG_MODEL_NOT_FOUND))?;
    Ok(Json(favorite))
}

async fn remove_favorite(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
    Path(model_id): Path<String>,
) -> ApiResult<Response> {
    let model_id = parse_model_id(&model_id)?;
    let removed = user_manager.remove_favorite(&session.user_id, model_id)?;
    Ok(Json(serde_json::json!({ "removed": removed })).into_response())
}

// =============================================================================
// Sessions
// =============================================================================

async fn sign_in(
    State(state): State<ServerState>,
    body: Result<Json<SignInBody>, JsonRejection>,
) -> ApiResult<Response> {
    let verifier: &Arc<dyn IdentityVerifier> = state
        .identity_verifier
        .as_ref()
        .ok_or(ApiError::ServiceUnavailable(MSG_IDENTITY_DISABLED))?;
    let body = json_or_400(body)?;

    let identity = verifier.verify(&body.id_token).map_err(|e| {
        debug!("Rejected identity token: {}", e);
        ApiError::Unauthorized(MSG_INVALID_IDENTITY)
    })?;
    let (user, session) = state.user_manager.sign_in(&identity)?;
    info!("User {} signed in", user.id);

    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, session.value.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(SignInResponse {
            token: session.value,
            user,
        }),
    )
        .into_response())
}

async fn get_session(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
) -> ApiResult<Response> {
    let user = user_manager
        .get_user(&session.user_id)?
        .ok_or(ApiError::NotFound(MSG_USER_NOT_FOUND))?;
    Ok(Json(serde_json::json!({ "user": user })).into_response())
}

async fn sign_out(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
) -> ApiResult<Response> {
    user_manager.sign_out(&session.token)?;
    debug!("User {} signed out", session.user_id);

    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build();

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response())
}

// =============================================================================
// Admin
// =============================================================================

async fn admin_list_models(
    State(state): State<ServerState>,
    session: Session,
) -> ApiResult<Json<Vec<Model>>> {
    require_admin(&session, &state.config)?;
    Ok(Json(
        state
            .catalog_store
            .list_all_models()
            .map_err(fetch_models_failed)?,
    ))
}

async fn admin_create_model(
    State(state): State<ServerState>,
    session: Session,
    body: Result<Json<NewModel>, JsonRejection>,
) -> ApiResult<Response> {
    require_admin(&session, &state.config)?;
    let new_model = json_or_400(body)?;
    validate_new_model(&new_model).map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let model = state.catalog_store.create_model(new_model)?;
    info!("Admin {} created model {} ({})", session.user_id, model.id, model.name);
    metrics::set_catalog_size(state.catalog_store.count_models()?);
    Ok((StatusCode::CREATED, Json(model)).into_response())
}

async fn admin_set_model_active(
    State(state): State<ServerState>,
    session: Session,
    Path(id): Path<String>,
    body: Result<Json<SetActiveBody>, JsonRejection>,
) -> ApiResult<Json<Model>> {
    require_admin(&session, &state.config)?;
    let id = parse_model_id(&id)?;
    let body = json_or_400(body)?;
    let model = state
        .catalog_store
        .set_model_active(id, body.is_active)?
        .ok_or(ApiError::NotFound(MSG_MODEL_NOT_FOUND))?;
    info!(
        "Admin {} set model {} active={}",
        session.user_id, model.id, model.is_active
    );
    Ok(Json(model))
}

// =============================================================================
// App
// =============================================================================

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    user_manager: GuardedUserManager,
    identity_verifier: OptionalIdentityVerifier,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), catalog_store, user_manager, identity_verifier);

    let model_routes: Router = Router::new()
        .route("/api/models", get(list_models))
        .route("/api/models/category/{category}", get(get_models_by_category))
        .route("/api/models/{id}", get(get_model))
        .route("/api/models/{id}/similar", get(get_similar_models))
        .route("/api/models/{id}/usage", post(record_model_usage))
        .with_state(state.clone());

    let recommendation_routes: Router = Router::new()
        .route("/api/recommendations", get(get_recommendations))
        .route(
            "/api/recommendations/accessible",
            get(get_accessible_recommendations),
        )
        .with_state(state.clone());

    let badge_routes: Router = Router::new()
        .route("/api/users/{user_id}/badges", get(get_user_badges))
        .route("/api/users/{user_id}/badges/status", get(get_user_badge_status))
        .route("/api/users/{user_id}/badges/earned", get(get_user_earned_badges))
        .route("/api/users/{user_id}/badges/progress", post(post_badge_progress))
        .route("/api/users/{user_id}/badges/earn", post(post_earn_badge))
        .with_state(state.clone());

    let favorite_routes: Router = Router::new()
        .route("/api/favorites", get(get_favorites).post(add_favorite))
        .route(
            "/api/favorites/{model_id}",
            axum::routing::delete(remove_favorite),
        )
        .with_state(state.clone());

    let auth_routes: Router = Router::new()
        .route(
            "/api/auth/session",
            post(sign_in).get(get_session).delete(sign_out),
        )
        .with_state(state.clone());

    let admin_routes: Router = Router::new()
        .route(
            "/api/admin/models",
            get(admin_list_models).post(admin_create_model),
        )
        .route("/api/admin/models/{id}/active", put(admin_set_model_active))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new()
                .route("/api/stats", get(home))
                .with_state(state.clone())
                .fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .route("/api/stats", get(home))
            .with_state(state.clone()),
    };

    #[allow(unused_mut)]
    let mut app: Router = home_router
        .merge(model_routes)
        .merge(recommendation_routes)
        .merge(badge_routes)
        .merge(favorite_routes)
        .merge(auth_routes)
        .merge(admin_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    let app = app.layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    user_manager: GuardedUserManager,
    identity_verifier: OptionalIdentityVerifier,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, catalog_store, user_manager, identity_verifier)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    tokio::select! {
        result = axum::serve(listener, app) => {
            result.context("API server stopped")
        }
        result = axum::serve(metrics_listener, make_metrics_app()) => {
            result.context("Metrics server stopped")
        }
    }
}
