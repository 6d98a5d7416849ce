use chrono::NaiveDate;
use wayfare_core::booking::{BookingTarget, TravelBooking};
use wayfare_core::catalog::{Car, Cruise, Flight, Hotel};

use crate::availability::{remaining_units, DateRange};
use crate::CatalogError;

/// A catalog item a travel booking can point at, resolved from its
/// `BookingTarget`.
#[derive(Debug, Clone)]
pub enum Bookable {
    Flight(Flight),
    Car(Car),
    Hotel(Hotel),
    Cruise(Cruise),
}

impl Bookable {
    pub fn target(&self) -> BookingTarget {
        match self {
            Bookable::Flight(f) => BookingTarget::Flight(f.id),
            Bookable::Car(c) => BookingTarget::Car(c.id),
            Bookable::Hotel(h) => BookingTarget::Hotel(h.id),
            Bookable::Cruise(c) => BookingTarget::Cruise(c.id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Bookable::Flight(_) => "flight",
            Bookable::Car(_) => "car",
            Bookable::Hotel(_) => "hotel",
            Bookable::Cruise(_) => "cruise",
        }
    }

    /// Seats, units, rooms or cabins.
    pub fn capacity(&self) -> u32 {
        match self {
            Bookable::Flight(f) => f.seats,
            Bookable::Car(c) => c.units,
            Bookable::Hotel(h) => h.rooms,
            Bookable::Cruise(c) => c.cabins,
        }
    }

    /// The dates a booking of this item holds.
    ///
    /// Flights and cruises carry their own schedule, so the requested dates are
    /// ignored for them. Hotels and cars need an explicit `[start, end)`.
    pub fn occupancy(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<DateRange, CatalogError> {
        match self {
            Bookable::Flight(f) => Ok(DateRange::single_day(f.departure_at.date_naive())),
            Bookable::Cruise(c) => Ok(DateRange::spanning(c.departure_date, c.nights)),
            Bookable::Hotel(_) | Bookable::Car(_) => {
                let end = end.ok_or(CatalogError::MissingEndDate(self.kind()))?;
                DateRange::new(start, end)
            }
        }
    }

    /// Fails with `SoldOut` when `quantity` units are not free over `range`,
    /// given the item's existing non-cancelled bookings.
    pub fn ensure_available(
        &self,
        existing: &[TravelBooking],
        range: &DateRange,
        quantity: u32,
    ) -> Result<(), CatalogError> {
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity);
        }
        let remaining = remaining_units(self.capacity(), existing, range);
        if quantity > remaining {
            return Err(CatalogError::SoldOut {
                kind: self.kind(),
                requested: quantity,
                remaining,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wayfare_core::booking::BookingStatus;
    use wayfare_core::{CarId, FlightId, TravelBookingId, UserId};
    use wayfare_shared::Money;

    fn flight(seats: u32) -> Flight {
        Flight {
            id: FlightId::new(),
            airline: "TAP".to_string(),
            flight_number: "TP1351".to_string(),
            origin: "LHR".to_string(),
            destination: "LIS".to_string(),
            departure_at: Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap(),
            arrival_at: Utc.with_ymd_and_hms(2025, 7, 1, 12, 10, 0).unwrap(),
            fare: Money::new(14_900, "EUR"),
            seats,
            created_at: Utc::now(),
        }
    }

    fn car(units: u32) -> Car {
        Car {
            id: CarId::new(),
            company: "Hertz".to_string(),
            model: "Fiat 500".to_string(),
            category: "compact".to_string(),
            location: "Lisbon".to_string(),
            daily_rate: Money::new(3_900, "EUR"),
            units,
            created_at: Utc::now(),
        }
    }

    fn held(target: BookingTarget, start: NaiveDate, end: Option<NaiveDate>, qty: u32) -> TravelBooking {
        TravelBooking {
            id: TravelBookingId::new(),
            user_id: UserId::new(),
            target,
            status: BookingStatus::Pending,
            start_date: start,
            end_date: end,
            quantity: qty,
            total_price: Money::zero("EUR"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    #[test]
    fn test_flight_occupies_departure_day() {
        let f = Bookable::Flight(flight(10));
        let range = f.occupancy(day(20), None).unwrap();
        assert_eq!(range.start, day(1));
        assert_eq!(range.nights(), 1);
    }

    #[test]
    fn test_car_requires_end_date() {
        let c = Bookable::Car(car(2));
        assert!(matches!(
            c.occupancy(day(1), None),
            Err(CatalogError::MissingEndDate("car"))
        ));
        assert!(matches!(
            c.occupancy(day(3), Some(day(2))),
            Err(CatalogError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_flight_sells_out() {
        let f = Bookable::Flight(flight(3));
        let range = f.occupancy(day(1), None).unwrap();
        let existing = vec![held(f.target(), day(1), None, 2)];

        assert!(f.ensure_available(&existing, &range, 1).is_ok());
        let err = f.ensure_available(&existing, &range, 2).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::SoldOut { requested: 2, remaining: 1, .. }
        ));
    }

    #[test]
    fn test_car_free_outside_existing_rental() {
        let c = Bookable::Car(car(1));
        let existing = vec![held(c.target(), day(1), Some(day(4)), 1)];

        let overlapping = c.occupancy(day(3), Some(day(6))).unwrap();
        assert!(c.ensure_available(&existing, &overlapping, 1).is_err());

        let after = c.occupancy(day(4), Some(day(6))).unwrap();
        assert!(c.ensure_available(&existing, &after, 1).is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let c = Bookable::Car(car(1));
        let range = c.occupancy(day(1), Some(day(2))).unwrap();
        assert!(matches!(
            c.ensure_available(&[], &range, 0),
            Err(CatalogError::InvalidQuantity)
        ));
    }
}
