//! HTTP handlers for the bottle catalog

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
use crate::services::bottle::{BottleFilter, BottleSummary, NewBottleInput, RankSort};
use crate::services::BottleService;
use crate::AppState;
use shared::{validate_search_query, BottleDetails, PaginatedResponse, Pagination};

#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 100, message = "Query must be 1-100 characters"))]
    pub query: String,
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50, message = "Limit must be 1-50"))]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FilterQuery {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub distillery: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(max = 50))]
    pub bottle_type: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub your_min: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub your_max: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub global_min: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub global_max: Option<f64>,
    pub sort: Option<RankSort>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,
}

impl FilterQuery {
    fn into_filter(self) -> AppResult<(BottleFilter, Pagination)> {
        let your_range = (self.your_min.unwrap_or(0.0), self.your_max.unwrap_or(100.0));
        let global_range = (
            self.global_min.unwrap_or(0.0),
            self.global_max.unwrap_or(100.0),
        );
        if your_range.0 > your_range.1 {
            return Err(AppError::field("your_min", "Minimum must not exceed maximum"));
        }
        if global_range.0 > global_range.1 {
            return Err(AppError::field("global_min", "Minimum must not exceed maximum"));
        }

        let filter = BottleFilter {
            name: self.name.filter(|s| !s.trim().is_empty()),
            distillery: self.distillery.filter(|s| !s.trim().is_empty()),
            bottle_type: self.bottle_type.filter(|s| !s.trim().is_empty()),
            your_range,
            global_range,
            sort: self.sort.unwrap_or_default(),
        };
        Ok((filter, Pagination::new(self.page, self.limit)))
    }
}

/// Full-text search of the approved catalog
pub async fn search_bottles(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<PaginatedResponse<BottleSummary>>> {
    query.validate()?;
    validate_search_query(&query.query).map_err(|m| AppError::field("query", m))?;
    let service = BottleService::new(state.db);
    let results = service
        .search(query.query.trim(), Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(results))
}

/// Filter the catalog by fields and percentile ranges
pub async fn filter_bottles(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<FilterQuery>,
) -> AppResult<Json<PaginatedResponse<BottleDetails>>> {
    query.validate()?;
    let (filter, pagination) = query.into_filter()?;
    let service = BottleService::new(state.db);
    let results = service
        .filter(current_user.0.user_id, &filter, pagination)
        .await?;
    Ok(Json(results))
}

/// Bottle details with the caller's and the community's ranking
pub async fn get_bottle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bottle_id): Path<Uuid>,
) -> AppResult<Json<BottleDetails>> {
    let service = BottleService::new(state.db);
    let details = service.get_details(bottle_id, current_user.0.user_id).await?;
    Ok(Json(details))
}

/// Submit a new bottle for approval
pub async fn add_bottle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewBottleInput>,
) -> AppResult<(StatusCode, Json<BottleSummary>)> {
    let service = BottleService::new(state.db);
    let bottle = service.add(input, current_user.0.user_id).await?;
    Ok((StatusCode::CREATED, Json(BottleSummary::from(bottle))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_filter() -> FilterQuery {
        FilterQuery {
            name: None,
            distillery: None,
            bottle_type: None,
            your_min: None,
            your_max: None,
            global_min: None,
            global_max: None,
            sort: None,
            page: None,
            limit: None,
        }
    }

    #[test]
    fn test_filter_defaults() {
        let (filter, pagination) = empty_filter().into_filter().unwrap();
        assert_eq!(filter.your_range, (0.0, 100.0));
        assert_eq!(filter.sort, RankSort::Your);
        assert_eq!(pagination, Pagination::default());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let query = FilterQuery {
            global_min: Some(80.0),
            global_max: Some(20.0),
            ..empty_filter()
        };
        assert!(matches!(
            query.into_filter(),
            Err(AppError::Validation { field, .. }) if field == "global_min"
        ));
    }

    #[test]
    fn test_blank_text_filters_are_ignored() {
        let query = FilterQuery {
            name: Some("  ".to_string()),
            ..empty_filter()
        };
        let (filter, _) = query.into_filter().unwrap();
        assert!(filter.name.is_none());
    }

    #[test]
    fn test_search_limit_bounds() {
        let query = SearchQuery {
            query: "bourbon".to_string(),
            page: Some(1),
            limit: Some(51),
        };
        assert!(query.validate().is_err());
    }
}
