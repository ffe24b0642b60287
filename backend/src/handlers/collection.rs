//! HTTP handlers for the user's bar

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::collection::CollectionEntry;
use crate::services::CollectionService;
use crate::AppState;
use shared::{validate_search_query, CollectionEdit, CollectionItem};

#[derive(Debug, Deserialize)]
pub struct AddToCollectionRequest {
    pub bottle_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CollectionSearchQuery {
    #[validate(length(min = 1, max = 100, message = "Query must be 1-100 characters"))]
    pub query: String,
}

pub async fn list_collection(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CollectionEntry>>> {
    let service = CollectionService::new(state.db);
    let entries = service.list(current_user.0.user_id).await?;
    Ok(Json(entries))
}

/// Search the bar by name, distillery, or type
pub async fn search_collection(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<CollectionSearchQuery>,
) -> AppResult<Json<Vec<CollectionEntry>>> {
    query.validate()?;
    validate_search_query(&query.query).map_err(|m| AppError::field("query", m))?;
    let service = CollectionService::new(state.db);
    let entries = service
        .search(current_user.0.user_id, query.query.trim())
        .await?;
    Ok(Json(entries))
}

pub async fn add_to_collection(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<AddToCollectionRequest>,
) -> AppResult<(StatusCode, Json<CollectionItem>)> {
    let service = CollectionService::new(state.db);
    let item = service.add(current_user.0.user_id, body.bottle_id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Edit fill level, count, or notes of an item
pub async fn update_collection_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(edit): Json<CollectionEdit>,
) -> AppResult<Json<CollectionItem>> {
    let service = CollectionService::new(state.db);
    let item = service
        .update(current_user.0.user_id, item_id, &edit)
        .await?;
    Ok(Json(item))
}

pub async fn remove_from_collection(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = CollectionService::new(state.db);
    service.remove(current_user.0.user_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
