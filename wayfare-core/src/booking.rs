use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use wayfare_shared::Money;

use crate::{
    BookingId, CarId, CoreError, CruiseId, DestinationId, FlightId, HotelId, TravelBookingId,
    UserId,
};

/// Booking lifecycle: `pending -> confirmed`, `pending -> cancelled`,
/// `confirmed -> cancelled`. `cancelled` is terminal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    /// Statuses from which a transition to `next` is allowed.
    pub fn sources_of(next: BookingStatus) -> Vec<BookingStatus> {
        Self::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::validation(format!("unknown booking status '{}'", other))),
        }
    }
}

/// A stay at a destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub destination_id: DestinationId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guests: u32,
    pub total_price: Money,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Travel bookings
// ============================================================================

/// What a travel booking points at. Each variant carries the id type of its
/// own collection, so a flight booking can only ever reference a flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "referenceId", rename_all = "lowercase")]
pub enum BookingTarget {
    Flight(FlightId),
    Car(CarId),
    Hotel(HotelId),
    Cruise(CruiseId),
}

impl BookingTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            BookingTarget::Flight(_) => "flight",
            BookingTarget::Car(_) => "car",
            BookingTarget::Hotel(_) => "hotel",
            BookingTarget::Cruise(_) => "cruise",
        }
    }

    pub fn reference_id(&self) -> Uuid {
        match self {
            BookingTarget::Flight(id) => id.0,
            BookingTarget::Car(id) => id.0,
            BookingTarget::Hotel(id) => id.0,
            BookingTarget::Cruise(id) => id.0,
        }
    }

    /// Rebuild a target from its stored discriminator and reference.
    pub fn from_parts(kind: &str, reference_id: Uuid) -> Result<Self, CoreError> {
        match kind {
            "flight" => Ok(BookingTarget::Flight(FlightId(reference_id))),
            "car" => Ok(BookingTarget::Car(CarId(reference_id))),
            "hotel" => Ok(BookingTarget::Hotel(HotelId(reference_id))),
            "cruise" => Ok(BookingTarget::Cruise(CruiseId(reference_id))),
            other => Err(CoreError::validation(format!("unknown booking target '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelBooking {
    pub id: TravelBookingId,
    pub user_id: UserId,
    pub target: BookingTarget,
    pub status: BookingStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Seats, rooms, cars or cabins.
    pub quantity: u32,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
