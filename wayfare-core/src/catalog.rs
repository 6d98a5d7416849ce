use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use wayfare_shared::Money;

use crate::{CarId, CruiseId, DestinationId, FlightId, HotelId, PackageId};

// ============================================================================
// Catalog entities
//
// Admin endpoints deserialize these directly; `id` and `created_at` are
// defaulted and then overwritten by the server.
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(default)]
    pub id: DestinationId,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    /// Price per guest per night.
    pub nightly_price: Money,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    #[serde(default)]
    pub id: HotelId,
    pub destination_id: Option<DestinationId>,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub address: String,
    pub star_rating: u8,
    /// Price per room per night.
    pub nightly_rate: Money,
    pub rooms: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    #[serde(default)]
    pub id: FlightId,
    pub airline: String,
    pub flight_number: String,
    /// IATA airport code.
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    /// Price per seat.
    pub fare: Money,
    pub seats: u32,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(default)]
    pub id: CarId,
    pub company: String,
    pub model: String,
    pub category: String,
    pub location: String,
    /// Price per unit per day.
    pub daily_rate: Money,
    pub units: u32,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cruise {
    #[serde(default)]
    pub id: CruiseId,
    pub cruise_line: String,
    pub ship: String,
    pub departure_port: String,
    #[serde(default)]
    pub itinerary: Vec<String>,
    pub departure_date: NaiveDate,
    pub nights: u32,
    /// Price per cabin for the whole sailing.
    pub cabin_price: Money,
    pub cabins: u32,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(default)]
    pub id: PackageId,
    pub destination_id: DestinationId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub nights: u32,
    pub price: Money,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Queries
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CruiseQuery {
    pub departure_port: Option<String>,
    /// 1-12, matched against the departure date.
    pub month: Option<u32>,
}
