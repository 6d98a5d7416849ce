use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use wayfare_booking::NewTravelBooking;
use wayfare_catalog::{Bookable, DateRange};
use wayfare_core::booking::TravelBooking;
use wayfare_core::catalog::{Car, Cruise, CruiseQuery, Destination, Flight, FlightQuery, Hotel, Package};
use wayfare_core::{CoreError, DestinationId, PackageId, TravelBookingId};

use crate::extract::{Json, Path, Query};
use crate::{error::AppError, middleware::Claims, state::AppState};

#[derive(Debug, Deserialize)]
struct HotelParams {
    destination: Option<DestinationId>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct CarParams {
    location: Option<String>,
    pick_up: Option<NaiveDate>,
    drop_off: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct CruiseParams {
    departure_port: Option<String>,
    month: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PackageParams {
    destination: Option<DestinationId>,
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/travel/destinations", get(list_destinations))
        .route("/api/travel/destinations/{id}", get(get_destination))
        .route("/api/travel/hotels", get(list_hotels))
        .route("/api/travel/flights", get(list_flights))
        .route("/api/travel/cars", get(list_cars))
        .route("/api/travel/cruises", get(list_cruises))
        .route("/api/travel/packages", get(list_packages))
        .route("/api/travel/packages/{id}", get(get_package))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/travel/bookings",
            post(create_travel_booking).get(list_travel_bookings),
        )
        .route("/api/travel/bookings/{id}", get(get_travel_booking))
        .route("/api/travel/bookings/{id}/cancel", post(cancel_travel_booking))
}

/// Both ends given: a validated range. One end alone is a client error.
fn requested_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Option<DateRange>, CoreError> {
    match (start, end) {
        (Some(start), Some(end)) => Ok(Some(DateRange::new(start, end)?)),
        (None, None) => Ok(None),
        _ => Err(CoreError::validation("both ends of the date range are required")),
    }
}

/// Keep the items with at least one unit free over `range`.
async fn only_available(
    state: &AppState,
    items: Vec<Bookable>,
    range: &DateRange,
) -> Result<Vec<Bookable>, AppError> {
    let mut available = Vec::with_capacity(items.len());
    for item in items {
        if state.travel.is_available(&item, range, 1).await? {
            available.push(item);
        }
    }
    Ok(available)
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /api/travel/destinations
async fn list_destinations(State(state): State<AppState>) -> Result<Json<Vec<Destination>>, AppError> {
    Ok(Json(state.repos.catalog.list_destinations().await?))
}

/// GET /api/travel/destinations/:id
async fn get_destination(
    State(state): State<AppState>,
    Path(id): Path<DestinationId>,
) -> Result<Json<Destination>, AppError> {
    let destination = state
        .repos
        .catalog
        .get_destination(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Destination not found"))?;
    Ok(Json(destination))
}

/// GET /api/travel/hotels?destination&check_in&check_out
async fn list_hotels(
    State(state): State<AppState>,
    Query(params): Query<HotelParams>,
) -> Result<Json<Vec<Hotel>>, AppError> {
    let range = requested_range(params.check_in, params.check_out)?;
    let hotels = state.repos.catalog.list_hotels(params.destination).await?;

    let Some(range) = range else {
        return Ok(Json(hotels));
    };
    let items = hotels.into_iter().map(Bookable::Hotel).collect();
    let hotels = only_available(&state, items, &range)
        .await?
        .into_iter()
        .filter_map(|item| match item {
            Bookable::Hotel(h) => Some(h),
            _ => None,
        })
        .collect();
    Ok(Json(hotels))
}

/// GET /api/travel/flights?origin&destination&date
async fn list_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightQuery>,
) -> Result<Json<Vec<Flight>>, AppError> {
    Ok(Json(state.repos.catalog.search_flights(&query).await?))
}

/// GET /api/travel/cars?location&pick_up&drop_off
async fn list_cars(
    State(state): State<AppState>,
    Query(params): Query<CarParams>,
) -> Result<Json<Vec<Car>>, AppError> {
    let range = requested_range(params.pick_up, params.drop_off)?;
    let cars = state.repos.catalog.list_cars(params.location.as_deref()).await?;

    let Some(range) = range else {
        return Ok(Json(cars));
    };
    let items = cars.into_iter().map(Bookable::Car).collect();
    let cars = only_available(&state, items, &range)
        .await?
        .into_iter()
        .filter_map(|item| match item {
            Bookable::Car(c) => Some(c),
            _ => None,
        })
        .collect();
    Ok(Json(cars))
}

/// GET /api/travel/cruises?departure_port&month
async fn list_cruises(
    State(state): State<AppState>,
    Query(params): Query<CruiseParams>,
) -> Result<Json<Vec<Cruise>>, AppError> {
    if let Some(month) = params.month {
        if !(1..=12).contains(&month) {
            return Err(CoreError::validation("month must be between 1 and 12").into());
        }
    }
    let query = CruiseQuery {
        departure_port: params.departure_port,
        month: params.month,
    };
    Ok(Json(state.repos.catalog.list_cruises(&query).await?))
}

/// GET /api/travel/packages?destination
async fn list_packages(
    State(state): State<AppState>,
    Query(params): Query<PackageParams>,
) -> Result<Json<Vec<Package>>, AppError> {
    Ok(Json(state.repos.catalog.list_packages(params.destination).await?))
}

async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<PackageId>,
) -> Result<Json<Package>, AppError> {
    let package = state
        .repos
        .catalog
        .get_package(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Package not found"))?;
    Ok(Json(package))
}

// ============================================================================
// Travel bookings
// ============================================================================

/// POST /api/travel/bookings
async fn create_travel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewTravelBooking>,
) -> Result<(StatusCode, Json<TravelBooking>), AppError> {
    let booking = state.travel.create_booking(claims.user_id(), req).await?;
    state.metrics.bookings_created.inc();
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/travel/bookings
async fn list_travel_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<TravelBooking>>, AppError> {
    Ok(Json(state.travel.list_bookings(claims.user_id()).await?))
}

/// GET /api/travel/bookings/:id
async fn get_travel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<TravelBookingId>,
) -> Result<Json<TravelBooking>, AppError> {
    Ok(Json(state.travel.get_booking(claims.user_id(), id).await?))
}

/// POST /api/travel/bookings/:id/cancel
async fn cancel_travel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<TravelBookingId>,
) -> Result<Json<TravelBooking>, AppError> {
    let booking = state.travel.cancel_booking(claims.user_id(), id).await?;
    state.metrics.bookings_cancelled.inc();
    Ok(Json(booking))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 3, d)
    }

    #[test]
    fn test_requested_range() {
        assert_eq!(requested_range(None, None).unwrap(), None);
        assert_eq!(requested_range(day(1), day(3)).unwrap().unwrap().nights(), 2);
        assert!(matches!(requested_range(day(3), day(3)), Err(CoreError::Validation(_))));
        assert!(matches!(requested_range(day(1), None), Err(CoreError::Validation(_))));
    }
}
