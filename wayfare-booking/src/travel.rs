use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use wayfare_catalog::{Bookable, DateRange};
use wayfare_core::booking::{BookingStatus, BookingTarget, TravelBooking};
use wayfare_core::repository::{CatalogRepository, TravelBookingRepository};
use wayfare_core::{CoreError, CoreResult, TravelBookingId, UserId};
use wayfare_shared::models::events::DomainEvent;

use crate::lifecycle::BookingError;
use crate::notifier::{capitalize, Notifier};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTravelBooking {
    pub target: BookingTarget,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "one_unit")]
    pub quantity: u32,
}

fn one_unit() -> u32 {
    1
}

/// Flight, car, hotel and cruise bookings
pub struct TravelBookingService {
    catalog: Arc<dyn CatalogRepository>,
    bookings: Arc<dyn TravelBookingRepository>,
    notifier: Arc<Notifier>,
}

impl TravelBookingService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        bookings: Arc<dyn TravelBookingRepository>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            catalog,
            bookings,
            notifier,
        }
    }

    /// Look the target up in the collection its variant names.
    pub async fn resolve(&self, target: BookingTarget) -> CoreResult<Bookable> {
        let found = match target {
            BookingTarget::Flight(id) => self.catalog.get_flight(id).await?.map(Bookable::Flight),
            BookingTarget::Car(id) => self.catalog.get_car(id).await?.map(Bookable::Car),
            BookingTarget::Hotel(id) => self.catalog.get_hotel(id).await?.map(Bookable::Hotel),
            BookingTarget::Cruise(id) => self.catalog.get_cruise(id).await?.map(Bookable::Cruise),
        };
        found.ok_or_else(|| CoreError::not_found(format!("{} not found", capitalize(target.kind()))))
    }

    /// Whether `quantity` units of `bookable` are free over `range`.
    pub async fn is_available(
        &self,
        bookable: &Bookable,
        range: &DateRange,
        quantity: u32,
    ) -> CoreResult<bool> {
        let existing = self.bookings.active_bookings_for(bookable.target()).await?;
        Ok(bookable.ensure_available(&existing, range, quantity).is_ok())
    }

    pub async fn create_booking(
        &self,
        user_id: UserId,
        input: NewTravelBooking,
    ) -> CoreResult<TravelBooking> {
        let bookable = self.resolve(input.target).await?;
        let range = bookable.occupancy(input.start_date, input.end_date)?;
        let total_price = bookable.quote(&range, input.quantity)?;

        let now = Utc::now();
        let booking = TravelBooking {
            id: TravelBookingId::new(),
            user_id,
            target: input.target,
            status: BookingStatus::default(),
            start_date: range.start,
            end_date: match bookable {
                Bookable::Flight(_) => None,
                _ => Some(range.end),
            },
            quantity: input.quantity,
            total_price,
            created_at: now,
            updated_at: now,
        };
        let quantity = input.quantity;
        self.bookings
            .insert_travel_booking(&booking, &|existing: &[TravelBooking]| {
                bookable
                    .ensure_available(existing, &range, quantity)
                    .map_err(CoreError::from)
            })
            .await?;

        tracing::info!(
            "Travel booking {} created: {} x{} ({})",
            booking.id,
            bookable.kind(),
            booking.quantity,
            booking.total_price
        );
        self.notifier
            .publish(DomainEvent::TravelBookingCreated {
                booking_id: booking.id.as_uuid(),
                user_id: user_id.as_uuid(),
                target_kind: bookable.kind().to_string(),
                total: booking.total_price.clone(),
            })
            .await;

        Ok(booking)
    }

    pub async fn list_bookings(&self, user_id: UserId) -> CoreResult<Vec<TravelBooking>> {
        self.bookings.list_user_travel_bookings(user_id).await
    }

    pub async fn get_booking(&self, user_id: UserId, id: TravelBookingId) -> CoreResult<TravelBooking> {
        self.bookings
            .get_user_travel_booking(id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking not found"))
    }

    /// Same at-most-once semantics as destination bookings.
    pub async fn cancel_booking(
        &self,
        user_id: UserId,
        id: TravelBookingId,
    ) -> CoreResult<TravelBooking> {
        let from = BookingStatus::sources_of(BookingStatus::Cancelled);
        let booking = self
            .bookings
            .transition_travel_booking(id, Some(user_id), &from, BookingStatus::Cancelled)
            .await?
            .ok_or(BookingError::NotFoundOrCancelled)?;

        tracing::info!("Travel booking {} cancelled", booking.id);
        self.notifier
            .publish(DomainEvent::TravelBookingCancelled {
                booking_id: booking.id.as_uuid(),
                user_id: user_id.as_uuid(),
            })
            .await;

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wayfare_core::catalog::{Flight, Hotel};
    use wayfare_core::{FlightId, HotelId};
    use wayfare_shared::Money;
    use wayfare_store::mailer::LogMailer;
    use wayfare_store::memory::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn setup() -> (TravelBookingService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(Notifier::new(store.clone(), store.clone(), Arc::new(LogMailer)));
        (
            TravelBookingService::new(store.clone(), store.clone(), notifier),
            store,
        )
    }

    fn hotel(rooms: u32) -> Hotel {
        Hotel {
            id: HotelId::new(),
            destination_id: None,
            name: "Harbour Inn".to_string(),
            city: "Bergen".to_string(),
            address: String::new(),
            star_rating: 3,
            nightly_rate: Money::new(11_000, "NOK"),
            rooms,
            amenities: vec![],
            created_at: Utc::now(),
        }
    }

    fn stay(target: BookingTarget, start: u32, end: u32) -> NewTravelBooking {
        NewTravelBooking {
            target,
            start_date: day(start),
            end_date: Some(day(end)),
            quantity: 1,
        }
    }

    #[tokio::test]
    async fn test_unknown_target_is_not_found() {
        let (service, _) = setup();
        let err = service
            .create_booking(UserId::new(), stay(BookingTarget::Hotel(HotelId::new()), 1, 3))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Hotel not found");
    }

    #[tokio::test]
    async fn test_hotel_rooms_follow_date_ranges() {
        let (service, _) = setup();
        let h = hotel(1);
        let target = BookingTarget::Hotel(h.id);
        service.catalog.create_hotel(&h).await.unwrap();

        let user = UserId::new();
        let first = service.create_booking(user, stay(target, 1, 4)).await.unwrap();
        assert_eq!(first.total_price.amount_minor, 33_000);

        let clash = service.create_booking(user, stay(target, 3, 5)).await.unwrap_err();
        assert!(matches!(clash, CoreError::InvalidState(_)));

        // checkout day is free for the next guest
        service.create_booking(user, stay(target, 4, 6)).await.unwrap();

        // cancelling frees the room again
        service.cancel_booking(user, first.id).await.unwrap();
        service.create_booking(user, stay(target, 2, 3)).await.unwrap();
    }

    #[tokio::test]
    async fn test_flight_booking_ignores_end_date() {
        let (service, _) = setup();
        let flight = Flight {
            id: FlightId::new(),
            airline: "SAS".to_string(),
            flight_number: "SK4168".to_string(),
            origin: "OSL".to_string(),
            destination: "BGO".to_string(),
            departure_at: Utc.with_ymd_and_hms(2025, 8, 10, 7, 0, 0).unwrap(),
            arrival_at: Utc.with_ymd_and_hms(2025, 8, 10, 7, 55, 0).unwrap(),
            fare: Money::new(79_900, "NOK"),
            seats: 2,
            created_at: Utc::now(),
        };
        service.catalog.create_flight(&flight).await.unwrap();

        let booking = service
            .create_booking(
                UserId::new(),
                NewTravelBooking {
                    target: BookingTarget::Flight(flight.id),
                    start_date: day(1),
                    end_date: None,
                    quantity: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(booking.start_date, day(10));
        assert_eq!(booking.end_date, None);
        assert_eq!(booking.total_price.amount_minor, 159_800);
    }

    #[tokio::test]
    async fn test_double_cancel() {
        let (service, _) = setup();
        let h = hotel(2);
        service.catalog.create_hotel(&h).await.unwrap();
        let user = UserId::new();
        let booking = service
            .create_booking(user, stay(BookingTarget::Hotel(h.id), 1, 2))
            .await
            .unwrap();

        service.cancel_booking(user, booking.id).await.unwrap();
        let err = service.cancel_booking(user, booking.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_cannot_oversell_last_room() {
        let (service, store) = setup();
        let h = hotel(1);
        service.catalog.create_hotel(&h).await.unwrap();
        let service = Arc::new(service);

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create_booking(UserId::new(), stay(BookingTarget::Hotel(h.id), 5, 7))
                        .await
                })
            })
            .collect();

        let mut booked = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => booked += 1,
                Err(err) => assert!(matches!(err, CoreError::InvalidState(_))),
            }
        }
        assert_eq!(booked, 1);
        let active = store.active_bookings_for(BookingTarget::Hotel(h.id)).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_capacity_check_stores_nothing() {
        let (service, store) = setup();
        let h = hotel(3);
        service.catalog.create_hotel(&h).await.unwrap();
        let booking = service
            .create_booking(UserId::new(), stay(BookingTarget::Hotel(h.id), 1, 2))
            .await
            .unwrap();

        let mut second = booking.clone();
        second.id = TravelBookingId::new();
        let err = store
            .insert_travel_booking(&second, &|existing: &[TravelBooking]| {
                assert_eq!(existing.len(), 1);
                Err(CoreError::invalid_state("full"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "full");
        let active = store.active_bookings_for(BookingTarget::Hotel(h.id)).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_is_available_over_range() {
        let (service, _) = setup();
        let h = hotel(1);
        service.catalog.create_hotel(&h).await.unwrap();
        service
            .create_booking(UserId::new(), stay(BookingTarget::Hotel(h.id), 10, 12))
            .await
            .unwrap();

        let item = Bookable::Hotel(h);
        let taken = DateRange::new(day(11), day(13)).unwrap();
        let free = DateRange::new(day(12), day(14)).unwrap();
        assert!(!service.is_available(&item, &taken, 1).await.unwrap());
        assert!(service.is_available(&item, &free, 1).await.unwrap());
    }
}
