//! Route definitions for the Pour Choices API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (signup/login public, verify/profile protected)
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - bottle catalog
        .nest("/spirits", spirit_routes(state.clone()))
        // Protected routes - the user's bar
        .nest("/collection", collection_routes(state.clone()))
        // Protected routes - blind tastings
        .nest("/tastings", tasting_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/verify", get(handlers::verify))
        .route("/profile", put(handlers::update_profile))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
}

/// Bottle catalog routes (protected)
fn spirit_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::add_bottle))
        .route("/search", get(handlers::search_bottles))
        .route("/filter", get(handlers::filter_bottles))
        .route("/:bottle_id", get(handlers::get_bottle))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Collection routes (protected)
fn collection_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_collection).post(handlers::add_to_collection),
        )
        .route("/search", get(handlers::search_collection))
        .route(
            "/:item_id",
            put(handlers::update_collection_item).delete(handlers::remove_from_collection),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Tasting routes (protected)
fn tasting_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_tastings).post(handlers::start_tasting))
        .route("/stats", get(handlers::get_tasting_stats))
        .route("/tags", get(handlers::suggest_tasting_tags))
        .route("/:tasting_id", get(handlers::get_tasting))
        .nest("/current", current_tasting_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Routes acting on the caller's tasting in progress
fn current_tasting_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_current_tasting))
        // Selection
        .route("/bottles", post(handlers::add_tasting_bottle))
        .route("/bottles/:bottle_id", delete(handlers::remove_tasting_bottle))
        .route("/candidates", get(handlers::list_tasting_candidates))
        .route("/pourer", post(handlers::proceed_to_pourer))
        // Pourer
        .route("/slots/randomize", post(handlers::randomize_slots))
        .route("/slots/:slot", put(handlers::assign_slot))
        .route("/taster", post(handlers::proceed_to_taster))
        // Taster
        .route("/notes/:slot/:section/tags", post(handlers::add_tasting_tag))
        .route(
            "/notes/:slot/:section/tags/:tag",
            delete(handlers::remove_tasting_tag),
        )
        .route("/notes/:slot/:section/custom", put(handlers::set_custom_note))
        .route("/ranking", put(handlers::update_ranking))
        // Reveal
        .route(
            "/reveal",
            get(handlers::get_reveal).post(handlers::reveal_tasting),
        )
        .route("/save", post(handlers::save_tasting))
}
