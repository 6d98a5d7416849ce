use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::activity::{Activity, ActivityQuery, Review, UserActivity};
use crate::booking::{Booking, BookingStatus, BookingTarget, TravelBooking};
use crate::catalog::{Car, Cruise, CruiseQuery, Destination, Flight, FlightQuery, Hotel, Package};
use crate::identity::User;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::notification::Notification;
use crate::payment::{Payment, PaymentMethod, PaymentStatus, PaymentStatusSummary};
use crate::{
    ActivityId, BookingId, CarId, CoreResult, CruiseId, DestinationId, FlightId, HotelId,
    InvoiceId, NotificationId, PackageId, PaymentId, PaymentMethodId, TravelBookingId, UserId,
};

// Lookups named `get_user_*` are scoped to the owner: a record belonging to
// someone else is reported as absent.

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `CoreError::Validation` when the email is taken.
    async fn create_user(&self, user: &User) -> CoreResult<()>;

    async fn get_user(&self, id: UserId) -> CoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    async fn count_users(&self) -> CoreResult<u64>;
}

/// Repository trait for the travel catalog
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_destination(&self, destination: &Destination) -> CoreResult<()>;
    async fn get_destination(&self, id: DestinationId) -> CoreResult<Option<Destination>>;
    async fn list_destinations(&self) -> CoreResult<Vec<Destination>>;
    /// `term` is already lowercased.
    async fn search_destinations(&self, term: &str, limit: usize) -> CoreResult<Vec<Destination>>;

    async fn create_hotel(&self, hotel: &Hotel) -> CoreResult<()>;
    async fn get_hotel(&self, id: HotelId) -> CoreResult<Option<Hotel>>;
    async fn list_hotels(&self, destination: Option<DestinationId>) -> CoreResult<Vec<Hotel>>;
    async fn search_hotels(&self, term: &str, limit: usize) -> CoreResult<Vec<Hotel>>;

    async fn create_flight(&self, flight: &Flight) -> CoreResult<()>;
    async fn get_flight(&self, id: FlightId) -> CoreResult<Option<Flight>>;
    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Vec<Flight>>;

    async fn create_car(&self, car: &Car) -> CoreResult<()>;
    async fn get_car(&self, id: CarId) -> CoreResult<Option<Car>>;
    async fn list_cars(&self, location: Option<&str>) -> CoreResult<Vec<Car>>;

    async fn create_cruise(&self, cruise: &Cruise) -> CoreResult<()>;
    async fn get_cruise(&self, id: CruiseId) -> CoreResult<Option<Cruise>>;
    async fn list_cruises(&self, query: &CruiseQuery) -> CoreResult<Vec<Cruise>>;

    async fn create_package(&self, package: &Package) -> CoreResult<()>;
    async fn get_package(&self, id: PackageId) -> CoreResult<Option<Package>>;
    async fn list_packages(&self, destination: Option<DestinationId>) -> CoreResult<Vec<Package>>;
}

/// Repository trait for destination bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()>;

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>>;

    async fn get_user_booking(&self, id: BookingId, user: UserId) -> CoreResult<Option<Booking>>;

    /// Newest first.
    async fn list_user_bookings(&self, user: UserId) -> CoreResult<Vec<Booking>>;

    /// Newest first.
    async fn list_bookings(&self) -> CoreResult<Vec<Booking>>;

    /// Conditional update: applies only while the current status is one of
    /// `from` (and the booking belongs to `owner`, when given). Returns the
    /// updated booking, or `None` when no row matched.
    async fn transition_booking(
        &self,
        id: BookingId,
        owner: Option<UserId>,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> CoreResult<Option<Booking>>;

    async fn count_bookings_by_status(&self) -> CoreResult<Vec<(BookingStatus, u64)>>;
}

/// Repository trait for flight, car, hotel and cruise bookings
#[async_trait]
pub trait TravelBookingRepository: Send + Sync {
    /// Insert `booking` only when `check` accepts the active bookings already
    /// on its target. The target stays locked from the read to the insert, so
    /// two concurrent requests cannot both take the last unit.
    async fn insert_travel_booking(
        &self,
        booking: &TravelBooking,
        check: &(dyn for<'a> Fn(&'a [TravelBooking]) -> CoreResult<()> + Send + Sync),
    ) -> CoreResult<()>;

    async fn get_user_travel_booking(
        &self,
        id: TravelBookingId,
        user: UserId,
    ) -> CoreResult<Option<TravelBooking>>;

    /// Newest first.
    async fn list_user_travel_bookings(&self, user: UserId) -> CoreResult<Vec<TravelBooking>>;

    /// Every booking on `target` that is not cancelled.
    async fn active_bookings_for(&self, target: BookingTarget) -> CoreResult<Vec<TravelBooking>>;

    /// Same conditional semantics as `BookingRepository::transition_booking`.
    async fn transition_travel_booking(
        &self,
        id: TravelBookingId,
        owner: Option<UserId>,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> CoreResult<Option<TravelBooking>>;
}

/// Repository trait for payments
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert_payment(&self, payment: &Payment) -> CoreResult<()>;

    async fn get_user_payment(&self, id: PaymentId, user: UserId) -> CoreResult<Option<Payment>>;

    async fn find_by_intent(&self, intent_id: &str) -> CoreResult<Option<Payment>>;

    /// Newest first.
    async fn list_user_payments(&self, user: UserId) -> CoreResult<Vec<Payment>>;

    /// Conditional update `from -> to`, recording `refund_id` when given.
    /// `None` when the payment is not currently in `from`.
    async fn transition_payment(
        &self,
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
        refund_id: Option<&str>,
    ) -> CoreResult<Option<Payment>>;

    async fn payment_summary(&self) -> CoreResult<Vec<PaymentStatusSummary>>;
}

/// Repository trait for saved payment methods
#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    /// Stores the method; it becomes the default exactly when the user has no
    /// default yet. `method.is_default` is ignored.
    async fn insert_method(&self, method: &PaymentMethod) -> CoreResult<PaymentMethod>;

    async fn get_user_method(
        &self,
        id: PaymentMethodId,
        user: UserId,
    ) -> CoreResult<Option<PaymentMethod>>;

    /// Default first, then newest first.
    async fn list_user_methods(&self, user: UserId) -> CoreResult<Vec<PaymentMethod>>;

    async fn delete_method(&self, id: PaymentMethodId, user: UserId) -> CoreResult<bool>;

    /// Makes `id` the user's only default in a single write. `false` when the
    /// method does not belong to the user, in which case nothing changes.
    async fn set_default_method(&self, id: PaymentMethodId, user: UserId) -> CoreResult<bool>;
}

/// Repository trait for invoices
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn insert_invoice(&self, invoice: &Invoice) -> CoreResult<()>;

    async fn get_user_invoice(&self, id: InvoiceId, user: UserId) -> CoreResult<Option<Invoice>>;

    async fn find_by_payment(&self, payment: PaymentId) -> CoreResult<Option<Invoice>>;

    /// Newest first.
    async fn list_user_invoices(&self, user: UserId) -> CoreResult<Vec<Invoice>>;

    /// Conditional update; stamps `issued_at`, `paid_at` or `voided_at` with
    /// `at` depending on `to`.
    async fn transition_invoice(
        &self,
        id: InvoiceId,
        user: UserId,
        from: &[InvoiceStatus],
        to: InvoiceStatus,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<Invoice>>;
}

/// Repository trait for activities and reviews
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn create_activity(&self, activity: &Activity) -> CoreResult<()>;

    /// Includes the reviews, oldest first.
    async fn get_activity(&self, id: ActivityId) -> CoreResult<Option<Activity>>;

    async fn list_activities(&self, query: &ActivityQuery) -> CoreResult<Vec<Activity>>;

    async fn search_activities(&self, term: &str, limit: usize) -> CoreResult<Vec<Activity>>;

    /// Appends the review and recomputes `rating`/`review_count` as one unit;
    /// concurrent reviews on the same activity never overwrite each other.
    async fn add_review(&self, id: ActivityId, review: &Review) -> CoreResult<Option<Activity>>;
}

/// Repository trait for user notifications
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> CoreResult<()>;

    /// Newest first.
    async fn list_user_notifications(&self, user: UserId) -> CoreResult<Vec<Notification>>;

    async fn unread_count(&self, user: UserId) -> CoreResult<u64>;

    async fn mark_read(&self, id: NotificationId, user: UserId) -> CoreResult<bool>;

    async fn mark_all_read(&self, user: UserId) -> CoreResult<u64>;

    async fn delete_notification(&self, id: NotificationId, user: UserId) -> CoreResult<bool>;
}

/// Repository trait for the user activity log
#[async_trait]
pub trait UserActivityRepository: Send + Sync {
    async fn record_activity(&self, activity: &UserActivity) -> CoreResult<()>;

    /// The `limit` most recent records, newest first.
    async fn recent_activity(&self, user: UserId, limit: usize) -> CoreResult<Vec<UserActivity>>;
}
