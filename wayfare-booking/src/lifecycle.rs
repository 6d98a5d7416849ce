use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use wayfare_catalog::{quote_stay, DateRange};
use wayfare_core::booking::{Booking, BookingStatus};
use wayfare_core::repository::{BookingRepository, CatalogRepository};
use wayfare_core::{BookingId, CoreError, CoreResult, DestinationId, UserId};
use wayfare_shared::models::events::DomainEvent;

use crate::notifier::Notifier;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub destination_id: DestinationId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "one_guest")]
    pub guests: u32,
    pub special_requests: Option<String>,
}

fn one_guest() -> u32 {
    1
}

/// Manages destination bookings and their state transitions
pub struct BookingService {
    catalog: Arc<dyn CatalogRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<Notifier>,
}

impl BookingService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            catalog,
            bookings,
            notifier,
        }
    }

    /// Create a pending booking priced from the destination's nightly rate
    pub async fn create_booking(&self, user_id: UserId, input: NewBooking) -> CoreResult<Booking> {
        let destination = self
            .catalog
            .get_destination(input.destination_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Destination not found"))?;

        let range = DateRange::new(input.start_date, input.end_date)?;
        let total_price = quote_stay(&destination, &range, input.guests)?;

        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            user_id,
            destination_id: destination.id,
            start_date: range.start,
            end_date: range.end,
            guests: input.guests,
            total_price,
            status: BookingStatus::default(),
            special_requests: input
                .special_requests
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            created_at: now,
            updated_at: now,
        };
        self.bookings.insert_booking(&booking).await?;

        tracing::info!(
            "Booking {} created for {} ({} nights, {})",
            booking.id,
            destination.name,
            range.nights(),
            booking.total_price
        );
        self.notifier
            .publish(DomainEvent::BookingCreated {
                booking_id: booking.id.as_uuid(),
                user_id: user_id.as_uuid(),
                total: booking.total_price.clone(),
            })
            .await;

        Ok(booking)
    }

    pub async fn list_bookings(&self, user_id: UserId) -> CoreResult<Vec<Booking>> {
        self.bookings.list_user_bookings(user_id).await
    }

    pub async fn list_all_bookings(&self) -> CoreResult<Vec<Booking>> {
        self.bookings.list_bookings().await
    }

    pub async fn get_booking(&self, user_id: UserId, id: BookingId) -> CoreResult<Booking> {
        self.bookings
            .get_user_booking(id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking not found"))
    }

    /// Transition: pending | confirmed -> cancelled, at most once.
    ///
    /// Absent, foreign and already-cancelled bookings are indistinguishable to
    /// the caller and nothing is written for them.
    pub async fn cancel_booking(&self, user_id: UserId, id: BookingId) -> CoreResult<Booking> {
        let from = BookingStatus::sources_of(BookingStatus::Cancelled);
        let booking = self
            .bookings
            .transition_booking(id, Some(user_id), &from, BookingStatus::Cancelled)
            .await?
            .ok_or(BookingError::NotFoundOrCancelled)?;

        tracing::info!("Booking {} cancelled", booking.id);
        self.notifier
            .publish(DomainEvent::BookingCancelled {
                booking_id: booking.id.as_uuid(),
                user_id: user_id.as_uuid(),
            })
            .await;

        Ok(booking)
    }

    /// Transition: pending -> confirmed (admin)
    pub async fn confirm_booking(&self, id: BookingId) -> CoreResult<Booking> {
        let current = self
            .bookings
            .get_booking(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking not found"))?;

        if !current.status.can_transition_to(BookingStatus::Confirmed) {
            return Err(BookingError::InvalidTransition {
                from: current.status,
                to: BookingStatus::Confirmed,
            }
            .into());
        }

        let booking = self
            .bookings
            .transition_booking(id, None, &[BookingStatus::Pending], BookingStatus::Confirmed)
            .await?
            .ok_or_else(|| CoreError::invalid_state("Booking changed while confirming"))?;

        tracing::info!("Booking {} confirmed", booking.id);
        self.notifier
            .publish(DomainEvent::BookingConfirmed {
                booking_id: booking.id.as_uuid(),
                user_id: booking.user_id.as_uuid(),
            })
            .await;

        Ok(booking)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found or already cancelled")]
    NotFoundOrCancelled,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
}

impl From<BookingError> for CoreError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFoundOrCancelled => CoreError::NotFound(err.to_string()),
            BookingError::InvalidTransition { .. } => CoreError::InvalidState(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::catalog::Destination;
    use wayfare_shared::Money;
    use wayfare_store::mailer::LogMailer;
    use wayfare_store::memory::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    async fn setup() -> (BookingService, Arc<MemoryStore>, DestinationId) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(Notifier::new(store.clone(), store.clone(), Arc::new(LogMailer)));
        let service = BookingService::new(store.clone(), store.clone(), notifier);

        let destination = Destination {
            id: DestinationId::new(),
            name: "Reykjavik".to_string(),
            country: "Iceland".to_string(),
            description: String::new(),
            image_url: None,
            nightly_price: Money::new(20_000, "USD"),
            tags: vec![],
            created_at: Utc::now(),
        };
        store.create_destination(&destination).await.unwrap();
        (service, store, destination.id)
    }

    fn request(destination_id: DestinationId) -> NewBooking {
        NewBooking {
            destination_id,
            start_date: day(1),
            end_date: day(4),
            guests: 2,
            special_requests: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_booking_is_pending_and_priced() {
        let (service, _, dest) = setup().await;
        let user = UserId::new();

        let booking = service.create_booking(user, request(dest)).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_price.amount_minor, 20_000 * 3 * 2);
        assert_eq!(booking.special_requests, None);
    }

    #[tokio::test]
    async fn test_create_booking_unknown_destination() {
        let (service, _, _) = setup().await;
        let err = service
            .create_booking(UserId::new(), request(DestinationId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_booking_rejects_inverted_dates() {
        let (service, _, dest) = setup().await;
        let mut input = request(dest);
        input.end_date = input.start_date;
        let err = service.create_booking(UserId::new(), input).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_second_cancel_reports_not_found_and_changes_nothing() {
        let (service, store, dest) = setup().await;
        let user = UserId::new();
        let booking = service.create_booking(user, request(dest)).await.unwrap();

        let cancelled = service.cancel_booking(user, booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = service.cancel_booking(user, booking.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Booking not found or already cancelled");

        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.updated_at, cancelled.updated_at);
    }

    #[tokio::test]
    async fn test_cannot_cancel_someone_elses_booking() {
        let (service, store, dest) = setup().await;
        let owner = UserId::new();
        let booking = service.create_booking(owner, request(dest)).await.unwrap();

        let err = service.cancel_booking(UserId::new(), booking.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirm_only_from_pending() {
        let (service, _, dest) = setup().await;
        let user = UserId::new();
        let booking = service.create_booking(user, request(dest)).await.unwrap();

        let confirmed = service.confirm_booking(booking.id).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let err = service.confirm_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        // confirmed bookings can still be cancelled
        service.cancel_booking(user, booking.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (service, _, dest) = setup().await;
        let user = UserId::new();
        let first = service.create_booking(user, request(dest)).await.unwrap();
        let second = service.create_booking(user, request(dest)).await.unwrap();

        let listed = service.list_bookings(user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }
}
