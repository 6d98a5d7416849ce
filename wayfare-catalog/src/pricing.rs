use wayfare_core::catalog::Destination;
use wayfare_shared::Money;

use crate::availability::DateRange;
use crate::inventory::Bookable;
use crate::CatalogError;

/// Price of a destination stay: nightly price per guest, times nights, times
/// guests.
pub fn quote_stay(
    destination: &Destination,
    range: &DateRange,
    guests: u32,
) -> Result<Money, CatalogError> {
    if guests == 0 {
        return Err(CatalogError::InvalidQuantity);
    }
    destination
        .nightly_price
        .times(range.nights())
        .and_then(|m| m.times(guests))
        .ok_or(CatalogError::PriceOverflow)
}

impl Bookable {
    /// Total for `quantity` units over `range`. Flight fares and cruise cabin
    /// prices are per unit; hotel and car rates are per unit per day.
    pub fn quote(&self, range: &DateRange, quantity: u32) -> Result<Money, CatalogError> {
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity);
        }
        let unit = match self {
            Bookable::Flight(f) => Some(f.fare.clone()),
            Bookable::Cruise(c) => Some(c.cabin_price.clone()),
            Bookable::Hotel(h) => h.nightly_rate.times(range.nights()),
            Bookable::Car(c) => c.daily_rate.times(range.nights()),
        };
        unit.and_then(|u| u.times(quantity))
            .ok_or(CatalogError::PriceOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use wayfare_core::catalog::{Cruise, Hotel};
    use wayfare_core::{CruiseId, DestinationId, HotelId};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn lisbon() -> Destination {
        Destination {
            id: DestinationId::new(),
            name: "Lisbon".to_string(),
            country: "Portugal".to_string(),
            description: String::new(),
            image_url: None,
            nightly_price: Money::new(9_950, "EUR"),
            tags: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stay_price_in_minor_units() {
        let range = DateRange::new(day(1), day(4)).unwrap();
        let total = quote_stay(&lisbon(), &range, 2).unwrap();
        assert_eq!(total, Money::new(9_950 * 3 * 2, "EUR"));
    }

    #[test]
    fn test_stay_needs_a_guest() {
        let range = DateRange::new(day(1), day(2)).unwrap();
        assert!(quote_stay(&lisbon(), &range, 0).is_err());
    }

    #[test]
    fn test_hotel_priced_per_room_night() {
        let hotel = Bookable::Hotel(Hotel {
            id: HotelId::new(),
            destination_id: None,
            name: "Bairro Alto".to_string(),
            city: "Lisbon".to_string(),
            address: String::new(),
            star_rating: 5,
            nightly_rate: Money::new(30_000, "EUR"),
            rooms: 4,
            amenities: vec![],
            created_at: Utc::now(),
        });
        let range = DateRange::new(day(10), day(12)).unwrap();
        assert_eq!(hotel.quote(&range, 2).unwrap().amount_minor, 120_000);
    }

    #[test]
    fn test_cruise_priced_per_cabin() {
        let cruise = Bookable::Cruise(Cruise {
            id: CruiseId::new(),
            cruise_line: "MSC".to_string(),
            ship: "Seaview".to_string(),
            departure_port: "Barcelona".to_string(),
            itinerary: vec![],
            departure_date: day(5),
            nights: 7,
            cabin_price: Money::new(120_000, "EUR"),
            cabins: 10,
            created_at: Utc::now(),
        });
        let range = DateRange::spanning(day(5), 7);
        assert_eq!(cruise.quote(&range, 2).unwrap().amount_minor, 240_000);
    }
}
