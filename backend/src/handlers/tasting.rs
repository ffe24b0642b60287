//! HTTP handlers for blind tastings
//!
//! Everything under `/tastings/current` acts on the caller's tasting in progress.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::tasting::TastingSummary;
use crate::services::TastingService;
use crate::AppState;
use shared::{
    suggest_tags, Bottle, CompletedTasting, PaginatedResponse, Pagination, RevealReport, Section,
    Slot, TastingView, UserStats,
};

/// Longest free-text note accepted for one section
pub const MAX_CUSTOM_NOTE_LEN: usize = 500;

#[derive(Debug, Deserialize)]
pub struct BottleRequest {
    pub bottle_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TagRequest {
    #[validate(length(min = 1, max = 50, message = "Tag must be 1-50 characters"))]
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomNoteRequest {
    pub text: String,
}

/// Rank controls top to bottom; each names the slot chosen for that rank
#[derive(Debug, Deserialize)]
pub struct RankingRequest {
    pub controls: Vec<Option<Slot>>,
}

#[derive(Debug, Deserialize)]
pub struct TagSuggestionQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct TagSuggestionResponse {
    pub suggestions: Vec<&'static str>,
}

fn service(state: AppState) -> TastingService {
    TastingService::new(state.db, state.tastings, &state.config)
}

fn parse_slot(raw: &str) -> AppResult<Slot> {
    raw.parse().map_err(|m| AppError::field("slot", m))
}

// =============================================================================
// Selection
// =============================================================================

/// Start a tasting with a bottle from the caller's bar
pub async fn start_tasting(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<BottleRequest>,
) -> AppResult<(StatusCode, Json<TastingView>)> {
    let view = service(state)
        .start(current_user.0.user_id, body.bottle_id)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_current_tasting(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TastingView>> {
    Ok(Json(service(state).current(current_user.0.user_id).await?))
}

pub async fn add_tasting_bottle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<BottleRequest>,
) -> AppResult<Json<TastingView>> {
    let view = service(state)
        .add_bottle(current_user.0.user_id, body.bottle_id)
        .await?;
    Ok(Json(view))
}

pub async fn remove_tasting_bottle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bottle_id): Path<Uuid>,
) -> AppResult<Json<TastingView>> {
    let view = service(state)
        .remove_bottle(current_user.0.user_id, bottle_id)
        .await?;
    Ok(Json(view))
}

/// Bottles from the bar not yet in the tasting
pub async fn list_tasting_candidates(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Bottle>>> {
    Ok(Json(service(state).candidates(current_user.0.user_id).await?))
}

pub async fn proceed_to_pourer(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TastingView>> {
    Ok(Json(
        service(state)
            .proceed_to_pourer(current_user.0.user_id)
            .await?,
    ))
}

// =============================================================================
// Pourer
// =============================================================================

/// Pour a bottle into a slot
pub async fn assign_slot(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(slot): Path<String>,
    Json(body): Json<BottleRequest>,
) -> AppResult<Json<TastingView>> {
    let slot = parse_slot(&slot)?;
    let view = service(state)
        .assign(current_user.0.user_id, body.bottle_id, slot)
        .await?;
    Ok(Json(view))
}

/// Shuffle every selected bottle into a slot
pub async fn randomize_slots(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TastingView>> {
    Ok(Json(service(state).randomize(current_user.0.user_id).await?))
}

pub async fn proceed_to_taster(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TastingView>> {
    Ok(Json(
        service(state)
            .proceed_to_taster(current_user.0.user_id)
            .await?,
    ))
}

// =============================================================================
// Taster
// =============================================================================

pub async fn add_tasting_tag(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((slot, section)): Path<(String, Section)>,
    Json(body): Json<TagRequest>,
) -> AppResult<Json<TastingView>> {
    body.validate()?;
    let slot = parse_slot(&slot)?;
    let view = service(state)
        .add_tag(current_user.0.user_id, slot, section, &body.tag)
        .await?;
    Ok(Json(view))
}

pub async fn remove_tasting_tag(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((slot, section, tag)): Path<(String, Section, String)>,
) -> AppResult<Json<TastingView>> {
    let slot = parse_slot(&slot)?;
    let view = service(state)
        .remove_tag(current_user.0.user_id, slot, section, &tag)
        .await?;
    Ok(Json(view))
}

pub async fn set_custom_note(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((slot, section)): Path<(String, Section)>,
    Json(body): Json<CustomNoteRequest>,
) -> AppResult<Json<TastingView>> {
    if body.text.chars().count() > MAX_CUSTOM_NOTE_LEN {
        return Err(AppError::field(
            "text",
            "Custom notes must be at most 500 characters",
        ));
    }
    let slot = parse_slot(&slot)?;
    let view = service(state)
        .set_custom_note(current_user.0.user_id, slot, section, &body.text)
        .await?;
    Ok(Json(view))
}

/// Autocomplete from the flavor vocabulary
pub async fn suggest_tasting_tags(
    Query(query): Query<TagSuggestionQuery>,
) -> Json<TagSuggestionResponse> {
    Json(TagSuggestionResponse {
        suggestions: suggest_tags(&query.query).collect(),
    })
}

pub async fn update_ranking(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<RankingRequest>,
) -> AppResult<Json<TastingView>> {
    let view = service(state)
        .update_ranking(current_user.0.user_id, &body.controls)
        .await?;
    Ok(Json(view))
}

// =============================================================================
// Reveal
// =============================================================================

/// Lock the ranking and return the reveal
pub async fn reveal_tasting(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<RevealReport>> {
    Ok(Json(
        service(state)
            .proceed_to_reveal(current_user.0.user_id)
            .await?,
    ))
}

/// Fetch the reveal again, e.g. after a reload
pub async fn get_reveal(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<RevealReport>> {
    Ok(Json(service(state).reveal(current_user.0.user_id).await?))
}

pub async fn save_tasting(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<(StatusCode, Json<CompletedTasting>)> {
    let record = service(state).save(current_user.0.user_id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

// =============================================================================
// History
// =============================================================================

pub async fn list_tastings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<PaginatedResponse<TastingSummary>>> {
    let history = service(state)
        .history(
            current_user.0.user_id,
            Pagination::new(query.page, query.limit),
        )
        .await?;
    Ok(Json(history))
}

pub async fn get_tasting(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(tasting_id): Path<Uuid>,
) -> AppResult<Json<CompletedTasting>> {
    Ok(Json(
        service(state)
            .get(current_user.0.user_id, tasting_id)
            .await?,
    ))
}

pub async fn get_tasting_stats(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserStats>> {
    Ok(Json(service(state).stats(current_user.0.user_id).await?))
}
