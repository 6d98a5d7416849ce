//! Case-insensitive catalog filters shared by every repository backend.

use chrono::Datelike;
use wayfare_core::activity::{Activity, ActivityQuery};
use wayfare_core::catalog::{Car, Cruise, CruiseQuery, Destination, Flight, FlightQuery, Hotel};

/// Maximum rows returned per section of a global search.
pub const SEARCH_SECTION_LIMIT: usize = 20;

/// Trimmed and lowercased search term, `None` when blank.
pub fn normalize_term(raw: &str) -> Option<String> {
    let term = raw.trim().to_lowercase();
    if term.is_empty() {
        None
    } else {
        Some(term)
    }
}

fn contains(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(term)
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

pub fn destination_matches(d: &Destination, term: &str) -> bool {
    contains(&d.name, term) || contains(&d.country, term) || contains(&d.description, term)
}

pub fn hotel_matches(h: &Hotel, term: &str) -> bool {
    contains(&h.name, term) || contains(&h.city, term)
}

pub fn activity_matches(a: &Activity, term: &str) -> bool {
    contains(&a.title, term) || contains(&a.category, term)
}

pub fn flight_matches(f: &Flight, query: &FlightQuery) -> bool {
    query.origin.as_deref().map_or(true, |o| eq_ignore_case(&f.origin, o))
        && query
            .destination
            .as_deref()
            .map_or(true, |d| eq_ignore_case(&f.destination, d))
        && query
            .date
            .map_or(true, |date| f.departure_at.date_naive() == date)
}

pub fn car_matches(c: &Car, location: Option<&str>) -> bool {
    location.map_or(true, |l| contains(&c.location, &l.trim().to_lowercase()))
}

pub fn cruise_matches(c: &Cruise, query: &CruiseQuery) -> bool {
    query
        .departure_port
        .as_deref()
        .map_or(true, |p| eq_ignore_case(&c.departure_port, p))
        && query.month.map_or(true, |m| c.departure_date.month() == m)
}

pub fn activity_query_matches(a: &Activity, query: &ActivityQuery) -> bool {
    query
        .destination
        .map_or(true, |d| a.destination_id == Some(d))
        && query
            .category
            .as_deref()
            .map_or(true, |c| eq_ignore_case(&a.category, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use wayfare_core::{DestinationId, FlightId};
    use wayfare_shared::Money;

    fn kyoto() -> Destination {
        Destination {
            id: DestinationId::new(),
            name: "Kyoto".to_string(),
            country: "Japan".to_string(),
            description: "Temples and tea houses".to_string(),
            image_url: None,
            nightly_price: Money::new(15_000, "JPY"),
            tags: vec!["culture".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_blank_term_is_none() {
        assert_eq!(normalize_term("   "), None);
        assert_eq!(normalize_term(" KyoTo "), Some("kyoto".to_string()));
    }

    #[test]
    fn test_destination_match_is_case_insensitive() {
        let d = kyoto();
        assert!(destination_matches(&d, "japan"));
        assert!(destination_matches(&d, "tea"));
        assert!(!destination_matches(&d, "osaka"));
    }

    #[test]
    fn test_flight_filters_combine() {
        let f = Flight {
            id: FlightId::new(),
            airline: "ANA".to_string(),
            flight_number: "NH212".to_string(),
            origin: "LHR".to_string(),
            destination: "HND".to_string(),
            departure_at: Utc.with_ymd_and_hms(2025, 4, 2, 19, 0, 0).unwrap(),
            arrival_at: Utc.with_ymd_and_hms(2025, 4, 3, 15, 0, 0).unwrap(),
            fare: Money::new(90_000, "GBP"),
            seats: 200,
            created_at: Utc::now(),
        };

        let mut q = FlightQuery {
            origin: Some("lhr".to_string()),
            destination: None,
            date: NaiveDate::from_ymd_opt(2025, 4, 2),
        };
        assert!(flight_matches(&f, &q));

        q.destination = Some("KIX".to_string());
        assert!(!flight_matches(&f, &q));
    }
}
