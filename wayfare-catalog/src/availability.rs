use chrono::{Days, NaiveDate};
use serde::Serialize;
use wayfare_core::booking::{BookingStatus, TravelBooking};

use crate::CatalogError;

/// Half-open date range `[start, end)`: a stay checking out on the 5th does
/// not occupy the 5th.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CatalogError> {
        if end <= start {
            return Err(CatalogError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// One calendar day starting at `day`.
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day.checked_add_days(Days::new(1)).unwrap_or(day),
        }
    }

    /// `start` plus `nights` nights (at least one day).
    pub fn spanning(start: NaiveDate, nights: u32) -> Self {
        let end = start
            .checked_add_days(Days::new(u64::from(nights.max(1))))
            .unwrap_or(start);
        Self { start, end }
    }

    pub fn nights(&self) -> u32 {
        (self.end - self.start).num_days().max(0) as u32
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The range a stored booking occupies.
    pub fn of_booking(booking: &TravelBooking) -> Self {
        match booking.end_date {
            Some(end) if end > booking.start_date => Self {
                start: booking.start_date,
                end,
            },
            _ => Self::single_day(booking.start_date),
        }
    }
}

/// Units held by non-cancelled bookings that overlap `range`.
pub fn booked_units(existing: &[TravelBooking], range: &DateRange) -> u32 {
    existing
        .iter()
        .filter(|b| b.status != BookingStatus::Cancelled)
        .filter(|b| DateRange::of_booking(b).overlaps(range))
        .map(|b| b.quantity)
        .sum()
}

pub fn remaining_units(capacity: u32, existing: &[TravelBooking], range: &DateRange) -> u32 {
    capacity.saturating_sub(booked_units(existing, range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wayfare_core::booking::BookingTarget;
    use wayfare_core::{HotelId, TravelBookingId, UserId};
    use wayfare_shared::Money;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn hotel_booking(start: u32, end: u32, rooms: u32, status: BookingStatus) -> TravelBooking {
        TravelBooking {
            id: TravelBookingId::new(),
            user_id: UserId::new(),
            target: BookingTarget::Hotel(HotelId::new()),
            status,
            start_date: day(start),
            end_date: Some(day(end)),
            quantity: rooms,
            total_price: Money::new(10_000, "USD"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_range_rejects_inverted_dates() {
        assert!(DateRange::new(day(5), day(5)).is_err());
        assert!(DateRange::new(day(6), day(5)).is_err());
        assert_eq!(DateRange::new(day(1), day(4)).unwrap().nights(), 3);
    }

    #[test]
    fn test_checkout_day_is_free() {
        let first = DateRange::new(day(1), day(5)).unwrap();
        let next = DateRange::new(day(5), day(8)).unwrap();
        assert!(!first.overlaps(&next));
        assert!(first.overlaps(&DateRange::new(day(4), day(6)).unwrap()));
    }

    #[test]
    fn test_cancelled_bookings_free_their_rooms() {
        let existing = vec![
            hotel_booking(1, 5, 2, BookingStatus::Confirmed),
            hotel_booking(3, 6, 1, BookingStatus::Cancelled),
            hotel_booking(10, 12, 4, BookingStatus::Pending),
        ];
        let range = DateRange::new(day(4), day(6)).unwrap();
        assert_eq!(booked_units(&existing, &range), 2);
        assert_eq!(remaining_units(3, &existing, &range), 1);
        assert_eq!(remaining_units(1, &existing, &range), 0);
    }
}
