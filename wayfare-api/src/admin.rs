use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use wayfare_core::activity::Activity;
use wayfare_core::booking::Booking;
use wayfare_core::catalog::{Car, Cruise, Destination, Flight, Hotel, Package};
use wayfare_core::payment::{PaymentStatus, PaymentStatusSummary};
use wayfare_core::{
    ActivityId, BookingId, CarId, CoreError, CruiseId, DestinationId, FlightId, HotelId, PackageId,
};
use wayfare_shared::Money;

use crate::extract::{Json, Path};
use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    users: u64,
    bookings: BTreeMap<String, u64>,
    payments: Vec<PaymentStatusSummary>,
    /// Completed payments, minor units.
    revenue_minor: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/bookings", get(list_bookings))
        .route("/api/admin/bookings/{id}/confirm", post(confirm_booking))
        .route("/api/admin/destinations", post(create_destination))
        .route("/api/admin/hotels", post(create_hotel))
        .route("/api/admin/flights", post(create_flight))
        .route("/api/admin/cars", post(create_car))
        .route("/api/admin/cruises", post(create_cruise))
        .route("/api/admin/packages", post(create_package))
        .route("/api/admin/activities", post(create_activity))
}

fn required(value: &str, field: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Prices arrive straight from the request body, so the currency must already
/// be an upper-case ISO 4217 code.
fn valid_price(price: &Money, field: &str) -> Result<(), CoreError> {
    if price.amount_minor < 0 {
        return Err(CoreError::validation(format!("{} must not be negative", field)));
    }
    if price.currency.len() != 3 || !price.currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(CoreError::validation(format!(
            "{} currency must be a three-letter ISO code",
            field
        )));
    }
    Ok(())
}

fn revenue(summary: &[PaymentStatusSummary]) -> i64 {
    summary
        .iter()
        .filter(|s| s.status == PaymentStatus::Completed)
        .map(|s| s.amount_minor)
        .sum()
}

// ============================================================================
// Reporting and booking management
// ============================================================================

/// GET /api/admin/stats
async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, AppError> {
    let users = state.repos.users.count_users().await?;
    let bookings = state
        .repos
        .bookings
        .count_bookings_by_status()
        .await?
        .into_iter()
        .map(|(status, count)| (status.to_string(), count))
        .collect();
    let payments = state.repos.payments.payment_summary().await?;

    Ok(Json(Stats {
        users,
        bookings,
        revenue_minor: revenue(&payments),
        payments,
    }))
}

/// GET /api/admin/bookings
async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list_all_bookings().await?))
}

/// POST /api/admin/bookings/:id/confirm
async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.confirm_booking(id).await?))
}

// ============================================================================
// Catalog management
// ============================================================================

/// POST /api/admin/destinations
async fn create_destination(
    State(state): State<AppState>,
    Json(mut destination): Json<Destination>,
) -> Result<(StatusCode, Json<Destination>), AppError> {
    required(&destination.name, "name")?;
    required(&destination.country, "country")?;
    valid_price(&destination.nightly_price, "nightlyPrice")?;

    destination.id = DestinationId::new();
    destination.created_at = Utc::now();
    state.repos.catalog.create_destination(&destination).await?;
    tracing::info!("Destination {} created: {}", destination.id, destination.name);
    Ok((StatusCode::CREATED, Json(destination)))
}

/// POST /api/admin/hotels
async fn create_hotel(
    State(state): State<AppState>,
    Json(mut hotel): Json<Hotel>,
) -> Result<(StatusCode, Json<Hotel>), AppError> {
    required(&hotel.name, "name")?;
    required(&hotel.city, "city")?;
    valid_price(&hotel.nightly_rate, "nightlyRate")?;
    if !(1..=5).contains(&hotel.star_rating) {
        return Err(CoreError::validation("starRating must be between 1 and 5").into());
    }
    if let Some(destination) = hotel.destination_id {
        ensure_destination(&state, destination).await?;
    }

    hotel.id = HotelId::new();
    hotel.created_at = Utc::now();
    state.repos.catalog.create_hotel(&hotel).await?;
    tracing::info!("Hotel {} created: {}", hotel.id, hotel.name);
    Ok((StatusCode::CREATED, Json(hotel)))
}

/// POST /api/admin/flights
async fn create_flight(
    State(state): State<AppState>,
    Json(mut flight): Json<Flight>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    required(&flight.airline, "airline")?;
    required(&flight.flight_number, "flightNumber")?;
    required(&flight.origin, "origin")?;
    required(&flight.destination, "destination")?;
    valid_price(&flight.fare, "fare")?;
    if flight.arrival_at <= flight.departure_at {
        return Err(CoreError::validation("arrivalAt must be after departureAt").into());
    }

    flight.id = FlightId::new();
    flight.origin = flight.origin.trim().to_uppercase();
    flight.destination = flight.destination.trim().to_uppercase();
    flight.created_at = Utc::now();
    state.repos.catalog.create_flight(&flight).await?;
    tracing::info!("Flight {} created: {} {}", flight.id, flight.airline, flight.flight_number);
    Ok((StatusCode::CREATED, Json(flight)))
}

/// POST /api/admin/cars
async fn create_car(
    State(state): State<AppState>,
    Json(mut car): Json<Car>,
) -> Result<(StatusCode, Json<Car>), AppError> {
    required(&car.company, "company")?;
    required(&car.model, "model")?;
    required(&car.location, "location")?;
    valid_price(&car.daily_rate, "dailyRate")?;

    car.id = CarId::new();
    car.created_at = Utc::now();
    state.repos.catalog.create_car(&car).await?;
    tracing::info!("Car {} created: {} {}", car.id, car.company, car.model);
    Ok((StatusCode::CREATED, Json(car)))
}

/// POST /api/admin/cruises
async fn create_cruise(
    State(state): State<AppState>,
    Json(mut cruise): Json<Cruise>,
) -> Result<(StatusCode, Json<Cruise>), AppError> {
    required(&cruise.cruise_line, "cruiseLine")?;
    required(&cruise.ship, "ship")?;
    required(&cruise.departure_port, "departurePort")?;
    valid_price(&cruise.cabin_price, "cabinPrice")?;
    if cruise.nights == 0 {
        return Err(CoreError::validation("nights must be at least 1").into());
    }

    cruise.id = CruiseId::new();
    cruise.created_at = Utc::now();
    state.repos.catalog.create_cruise(&cruise).await?;
    tracing::info!("Cruise {} created: {} {}", cruise.id, cruise.cruise_line, cruise.ship);
    Ok((StatusCode::CREATED, Json(cruise)))
}

/// POST /api/admin/packages
async fn create_package(
    State(state): State<AppState>,
    Json(mut package): Json<Package>,
) -> Result<(StatusCode, Json<Package>), AppError> {
    required(&package.title, "title")?;
    valid_price(&package.price, "price")?;
    if package.nights == 0 {
        return Err(CoreError::validation("nights must be at least 1").into());
    }
    ensure_destination(&state, package.destination_id).await?;

    package.id = PackageId::new();
    package.created_at = Utc::now();
    state.repos.catalog.create_package(&package).await?;
    tracing::info!("Package {} created: {}", package.id, package.title);
    Ok((StatusCode::CREATED, Json(package)))
}

/// POST /api/admin/activities
/// Ratings always start empty; they only come from reviews.
async fn create_activity(
    State(state): State<AppState>,
    Json(mut activity): Json<Activity>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    required(&activity.title, "title")?;
    required(&activity.category, "category")?;
    valid_price(&activity.price, "price")?;
    if let Some(destination) = activity.destination_id {
        ensure_destination(&state, destination).await?;
    }

    activity.id = ActivityId::new();
    activity.rating = 0.0;
    activity.review_count = 0;
    activity.reviews.clear();
    activity.created_at = Utc::now();
    state.repos.activities.create_activity(&activity).await?;
    tracing::info!("Activity {} created: {}", activity.id, activity.title);
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn ensure_destination(state: &AppState, id: DestinationId) -> Result<(), AppError> {
    state
        .repos
        .catalog
        .get_destination(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Destination not found"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_validation() {
        assert!(valid_price(&Money::new(0, "EUR"), "price").is_ok());
        assert!(valid_price(&Money::new(-1, "EUR"), "price").is_err());
        assert!(valid_price(&Money::new(100, "EURO"), "price").is_err());

        // request bodies are not normalized the way `Money::new` is
        let lowercase: Money =
            serde_json::from_value(serde_json::json!({ "amountMinor": 100, "currency": "eur" }))
                .unwrap();
        assert!(valid_price(&lowercase, "price").is_err());
        assert!(valid_price(&Money::new(100, "eur"), "price").is_ok());
    }

    #[test]
    fn test_revenue_counts_completed_only() {
        let summary = vec![
            PaymentStatusSummary {
                status: PaymentStatus::Completed,
                count: 2,
                amount_minor: 30_000,
            },
            PaymentStatusSummary {
                status: PaymentStatus::Refunded,
                count: 1,
                amount_minor: 9_000,
            },
        ];
        assert_eq!(revenue(&summary), 30_000);
    }
}
