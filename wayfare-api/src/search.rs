use axum::{
    extract::State,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use wayfare_catalog::search::{normalize_term, SEARCH_SECTION_LIMIT};
use wayfare_core::activity::Activity;
use wayfare_core::catalog::{Destination, Hotel};
use wayfare_core::places::PlaceSuggestion;

use crate::extract::{Json, Query};
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
struct PlacesParams {
    #[serde(default)]
    input: String,
}

#[derive(Debug, Default, Serialize)]
struct SearchResults {
    destinations: Vec<Destination>,
    hotels: Vec<Hotel>,
    activities: Vec<Activity>,
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/search/places", get(places))
}

/// GET /api/search?q=
/// A blank query matches nothing.
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, AppError> {
    let Some(term) = normalize_term(&params.q) else {
        return Ok(Json(SearchResults::default()));
    };

    let catalog = &state.repos.catalog;
    let (destinations, hotels, activities) = tokio::try_join!(
        catalog.search_destinations(&term, SEARCH_SECTION_LIMIT),
        catalog.search_hotels(&term, SEARCH_SECTION_LIMIT),
        state.repos.activities.search_activities(&term, SEARCH_SECTION_LIMIT),
    )?;

    Ok(Json(SearchResults {
        destinations,
        hotels,
        activities,
    }))
}

/// GET /api/search/places?input=
async fn places(
    State(state): State<AppState>,
    Query(params): Query<PlacesParams>,
) -> Result<Json<Vec<PlaceSuggestion>>, AppError> {
    let input = params.input.trim();
    if input.is_empty() {
        return Ok(Json(Vec::new()));
    }
    Ok(Json(state.places.autocomplete(input).await?))
}
