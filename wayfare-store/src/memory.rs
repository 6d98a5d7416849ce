//! In-memory implementation of every repository trait.
//!
//! All tables sit behind one lock, so each trait method is atomic with
//! respect to every other, including the multi-row default-card switch and
//! review aggregation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use wayfare_catalog::{apply_review, search};
use wayfare_core::activity::{Activity, ActivityQuery, Review, UserActivity};
use wayfare_core::booking::{Booking, BookingStatus, BookingTarget, TravelBooking};
use wayfare_core::catalog::{
    Car, Cruise, CruiseQuery, Destination, Flight, FlightQuery, Hotel, Package,
};
use wayfare_core::identity::User;
use wayfare_core::invoice::{Invoice, InvoiceStatus};
use wayfare_core::notification::Notification;
use wayfare_core::payment::{Payment, PaymentMethod, PaymentStatus, PaymentStatusSummary};
use wayfare_core::repository::*;
use wayfare_core::{
    ActivityId, BookingId, CarId, CoreError, CoreResult, CruiseId, DestinationId, FlightId,
    HotelId, InvoiceId, NotificationId, PackageId, PaymentId, PaymentMethodId, TravelBookingId,
    UserId,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    destinations: Vec<Destination>,
    hotels: Vec<Hotel>,
    flights: Vec<Flight>,
    cars: Vec<Car>,
    cruises: Vec<Cruise>,
    packages: Vec<Package>,
    bookings: Vec<Booking>,
    travel_bookings: Vec<TravelBooking>,
    payments: Vec<Payment>,
    methods: Vec<PaymentMethod>,
    invoices: Vec<Invoice>,
    activities: Vec<Activity>,
    notifications: Vec<Notification>,
    user_activity: Vec<UserActivity>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".to_string()))
    }
}

/// Newest first; among equal timestamps the later insert wins.
fn newest_first<T>(
    items: impl DoubleEndedIterator<Item = T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    out
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> CoreResult<()> {
        let mut t = self.lock()?;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(CoreError::validation("Email already registered"));
        }
        t.users.push(user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> CoreResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| *u.email.expose() == email)
            .cloned())
    }

    async fn count_users(&self) -> CoreResult<u64> {
        Ok(self.lock()?.users.len() as u64)
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn create_destination(&self, destination: &Destination) -> CoreResult<()> {
        self.lock()?.destinations.push(destination.clone());
        Ok(())
    }

    async fn get_destination(&self, id: DestinationId) -> CoreResult<Option<Destination>> {
        Ok(self.lock()?.destinations.iter().find(|d| d.id == id).cloned())
    }

    async fn list_destinations(&self) -> CoreResult<Vec<Destination>> {
        let mut out = self.lock()?.destinations.clone();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn search_destinations(&self, term: &str, limit: usize) -> CoreResult<Vec<Destination>> {
        Ok(self
            .lock()?
            .destinations
            .iter()
            .filter(|d| search::destination_matches(d, term))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_hotel(&self, hotel: &Hotel) -> CoreResult<()> {
        self.lock()?.hotels.push(hotel.clone());
        Ok(())
    }

    async fn get_hotel(&self, id: HotelId) -> CoreResult<Option<Hotel>> {
        Ok(self.lock()?.hotels.iter().find(|h| h.id == id).cloned())
    }

    async fn list_hotels(&self, destination: Option<DestinationId>) -> CoreResult<Vec<Hotel>> {
        let mut out: Vec<Hotel> = self
            .lock()?
            .hotels
            .iter()
            .filter(|h| destination.map_or(true, |d| h.destination_id == Some(d)))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn search_hotels(&self, term: &str, limit: usize) -> CoreResult<Vec<Hotel>> {
        Ok(self
            .lock()?
            .hotels
            .iter()
            .filter(|h| search::hotel_matches(h, term))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_flight(&self, flight: &Flight) -> CoreResult<()> {
        self.lock()?.flights.push(flight.clone());
        Ok(())
    }

    async fn get_flight(&self, id: FlightId) -> CoreResult<Option<Flight>> {
        Ok(self.lock()?.flights.iter().find(|f| f.id == id).cloned())
    }

    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Vec<Flight>> {
        let mut out: Vec<Flight> = self
            .lock()?
            .flights
            .iter()
            .filter(|f| search::flight_matches(f, query))
            .cloned()
            .collect();
        out.sort_by_key(|f| f.departure_at);
        Ok(out)
    }

    async fn create_car(&self, car: &Car) -> CoreResult<()> {
        self.lock()?.cars.push(car.clone());
        Ok(())
    }

    async fn get_car(&self, id: CarId) -> CoreResult<Option<Car>> {
        Ok(self.lock()?.cars.iter().find(|c| c.id == id).cloned())
    }

    async fn list_cars(&self, location: Option<&str>) -> CoreResult<Vec<Car>> {
        let mut out: Vec<Car> = self
            .lock()?
            .cars
            .iter()
            .filter(|c| search::car_matches(c, location))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.daily_rate.amount_minor);
        Ok(out)
    }

    async fn create_cruise(&self, cruise: &Cruise) -> CoreResult<()> {
        self.lock()?.cruises.push(cruise.clone());
        Ok(())
    }

    async fn get_cruise(&self, id: CruiseId) -> CoreResult<Option<Cruise>> {
        Ok(self.lock()?.cruises.iter().find(|c| c.id == id).cloned())
    }

    async fn list_cruises(&self, query: &CruiseQuery) -> CoreResult<Vec<Cruise>> {
        let mut out: Vec<Cruise> = self
            .lock()?
            .cruises
            .iter()
            .filter(|c| search::cruise_matches(c, query))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.departure_date);
        Ok(out)
    }

    async fn create_package(&self, package: &Package) -> CoreResult<()> {
        self.lock()?.packages.push(package.clone());
        Ok(())
    }

    async fn get_package(&self, id: PackageId) -> CoreResult<Option<Package>> {
        Ok(self.lock()?.packages.iter().find(|p| p.id == id).cloned())
    }

    async fn list_packages(&self, destination: Option<DestinationId>) -> CoreResult<Vec<Package>> {
        let mut out: Vec<Package> = self
            .lock()?
            .packages
            .iter()
            .filter(|p| destination.map_or(true, |d| p.destination_id == d))
            .cloned()
            .collect();
        out.sort_by_key(|p| p.price.amount_minor);
        Ok(out)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        self.lock()?.bookings.push(booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        Ok(self.lock()?.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn get_user_booking(&self, id: BookingId, user: UserId) -> CoreResult<Option<Booking>> {
        Ok(self
            .lock()?
            .bookings
            .iter()
            .find(|b| b.id == id && b.user_id == user)
            .cloned())
    }

    async fn list_user_bookings(&self, user: UserId) -> CoreResult<Vec<Booking>> {
        let t = self.lock()?;
        Ok(newest_first(
            t.bookings.iter().filter(|b| b.user_id == user).cloned(),
            |b| b.created_at,
        ))
    }

    async fn list_bookings(&self) -> CoreResult<Vec<Booking>> {
        let t = self.lock()?;
        Ok(newest_first(t.bookings.iter().cloned(), |b| b.created_at))
    }

    async fn transition_booking(
        &self,
        id: BookingId,
        owner: Option<UserId>,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let mut t = self.lock()?;
        let Some(booking) = t.bookings.iter_mut().find(|b| {
            b.id == id && owner.map_or(true, |o| b.user_id == o) && from.contains(&b.status)
        }) else {
            return Ok(None);
        };
        booking.status = to;
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn count_bookings_by_status(&self) -> CoreResult<Vec<(BookingStatus, u64)>> {
        let t = self.lock()?;
        Ok(BookingStatus::ALL
            .into_iter()
            .map(|s| (s, t.bookings.iter().filter(|b| b.status == s).count() as u64))
            .collect())
    }
}

#[async_trait]
impl TravelBookingRepository for MemoryStore {
    async fn insert_travel_booking(
        &self,
        booking: &TravelBooking,
        check: &(dyn for<'a> Fn(&'a [TravelBooking]) -> CoreResult<()> + Send + Sync),
    ) -> CoreResult<()> {
        let mut t = self.lock()?;
        let existing: Vec<TravelBooking> = t
            .travel_bookings
            .iter()
            .filter(|b| b.target == booking.target && b.status != BookingStatus::Cancelled)
            .cloned()
            .collect();
        check(&existing)?;
        t.travel_bookings.push(booking.clone());
        Ok(())
    }

    async fn get_user_travel_booking(
        &self,
        id: TravelBookingId,
        user: UserId,
    ) -> CoreResult<Option<TravelBooking>> {
        Ok(self
            .lock()?
            .travel_bookings
            .iter()
            .find(|b| b.id == id && b.user_id == user)
            .cloned())
    }

    async fn list_user_travel_bookings(&self, user: UserId) -> CoreResult<Vec<TravelBooking>> {
        let t = self.lock()?;
        Ok(newest_first(
            t.travel_bookings.iter().filter(|b| b.user_id == user).cloned(),
            |b| b.created_at,
        ))
    }

    async fn active_bookings_for(&self, target: BookingTarget) -> CoreResult<Vec<TravelBooking>> {
        Ok(self
            .lock()?
            .travel_bookings
            .iter()
            .filter(|b| b.target == target && b.status != BookingStatus::Cancelled)
            .cloned()
            .collect())
    }

    async fn transition_travel_booking(
        &self,
        id: TravelBookingId,
        owner: Option<UserId>,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> CoreResult<Option<TravelBooking>> {
        let mut t = self.lock()?;
        let Some(booking) = t.travel_bookings.iter_mut().find(|b| {
            b.id == id && owner.map_or(true, |o| b.user_id == o) && from.contains(&b.status)
        }) else {
            return Ok(None);
        };
        booking.status = to;
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> CoreResult<()> {
        self.lock()?.payments.push(payment.clone());
        Ok(())
    }

    async fn get_user_payment(&self, id: PaymentId, user: UserId) -> CoreResult<Option<Payment>> {
        Ok(self
            .lock()?
            .payments
            .iter()
            .find(|p| p.id == id && p.user_id == user)
            .cloned())
    }

    async fn find_by_intent(&self, intent_id: &str) -> CoreResult<Option<Payment>> {
        Ok(self
            .lock()?
            .payments
            .iter()
            .find(|p| p.processor_intent_id == intent_id)
            .cloned())
    }

    async fn list_user_payments(&self, user: UserId) -> CoreResult<Vec<Payment>> {
        let t = self.lock()?;
        Ok(newest_first(
            t.payments.iter().filter(|p| p.user_id == user).cloned(),
            |p| p.created_at,
        ))
    }

    async fn transition_payment(
        &self,
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
        refund_id: Option<&str>,
    ) -> CoreResult<Option<Payment>> {
        let mut t = self.lock()?;
        let Some(payment) = t
            .payments
            .iter_mut()
            .find(|p| p.id == id && p.status == from)
        else {
            return Ok(None);
        };
        payment.status = to;
        if let Some(refund_id) = refund_id {
            payment.refund_id = Some(refund_id.to_string());
        }
        payment.updated_at = Utc::now();
        Ok(Some(payment.clone()))
    }

    async fn payment_summary(&self) -> CoreResult<Vec<PaymentStatusSummary>> {
        let t = self.lock()?;
        Ok(PaymentStatus::ALL
            .into_iter()
            .map(|status| {
                let matching = t.payments.iter().filter(|p| p.status == status);
                PaymentStatusSummary {
                    status,
                    count: matching.clone().count() as u64,
                    amount_minor: matching.map(|p| p.amount.amount_minor).sum(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl PaymentMethodRepository for MemoryStore {
    async fn insert_method(&self, method: &PaymentMethod) -> CoreResult<PaymentMethod> {
        let mut t = self.lock()?;
        let has_default = t
            .methods
            .iter()
            .any(|m| m.user_id == method.user_id && m.is_default);
        let stored = PaymentMethod {
            is_default: !has_default,
            ..method.clone()
        };
        t.methods.push(stored.clone());
        Ok(stored)
    }

    async fn get_user_method(
        &self,
        id: PaymentMethodId,
        user: UserId,
    ) -> CoreResult<Option<PaymentMethod>> {
        Ok(self
            .lock()?
            .methods
            .iter()
            .find(|m| m.id == id && m.user_id == user)
            .cloned())
    }

    async fn list_user_methods(&self, user: UserId) -> CoreResult<Vec<PaymentMethod>> {
        let t = self.lock()?;
        let mut out = newest_first(
            t.methods.iter().filter(|m| m.user_id == user).cloned(),
            |m| m.created_at,
        );
        out.sort_by_key(|m| !m.is_default);
        Ok(out)
    }

    async fn delete_method(&self, id: PaymentMethodId, user: UserId) -> CoreResult<bool> {
        let mut t = self.lock()?;
        let before = t.methods.len();
        t.methods.retain(|m| !(m.id == id && m.user_id == user));
        Ok(t.methods.len() != before)
    }

    async fn set_default_method(&self, id: PaymentMethodId, user: UserId) -> CoreResult<bool> {
        let mut t = self.lock()?;
        if !t.methods.iter().any(|m| m.id == id && m.user_id == user) {
            return Ok(false);
        }
        for m in t.methods.iter_mut().filter(|m| m.user_id == user) {
            m.is_default = m.id == id;
        }
        Ok(true)
    }
}

#[async_trait]
impl InvoiceRepository for MemoryStore {
    async fn insert_invoice(&self, invoice: &Invoice) -> CoreResult<()> {
        let mut t = self.lock()?;
        if t.invoices.iter().any(|i| i.payment_id == invoice.payment_id) {
            return Err(CoreError::invalid_state("Payment already has an invoice"));
        }
        t.invoices.push(invoice.clone());
        Ok(())
    }

    async fn get_user_invoice(&self, id: InvoiceId, user: UserId) -> CoreResult<Option<Invoice>> {
        Ok(self
            .lock()?
            .invoices
            .iter()
            .find(|i| i.id == id && i.user_id == user)
            .cloned())
    }

    async fn find_by_payment(&self, payment: PaymentId) -> CoreResult<Option<Invoice>> {
        Ok(self
            .lock()?
            .invoices
            .iter()
            .find(|i| i.payment_id == payment)
            .cloned())
    }

    async fn list_user_invoices(&self, user: UserId) -> CoreResult<Vec<Invoice>> {
        let t = self.lock()?;
        Ok(newest_first(
            t.invoices.iter().filter(|i| i.user_id == user).cloned(),
            |i| i.created_at,
        ))
    }

    async fn transition_invoice(
        &self,
        id: InvoiceId,
        user: UserId,
        from: &[InvoiceStatus],
        to: InvoiceStatus,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<Invoice>> {
        let mut t = self.lock()?;
        let Some(invoice) = t
            .invoices
            .iter_mut()
            .find(|i| i.id == id && i.user_id == user && from.contains(&i.status))
        else {
            return Ok(None);
        };
        invoice.status = to;
        match to {
            InvoiceStatus::Issued => invoice.issued_at = Some(at),
            InvoiceStatus::Paid => invoice.paid_at = Some(at),
            InvoiceStatus::Void => invoice.voided_at = Some(at),
            InvoiceStatus::Draft => {}
        }
        Ok(Some(invoice.clone()))
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn create_activity(&self, activity: &Activity) -> CoreResult<()> {
        self.lock()?.activities.push(activity.clone());
        Ok(())
    }

    async fn get_activity(&self, id: ActivityId) -> CoreResult<Option<Activity>> {
        Ok(self.lock()?.activities.iter().find(|a| a.id == id).cloned())
    }

    async fn list_activities(&self, query: &ActivityQuery) -> CoreResult<Vec<Activity>> {
        Ok(self
            .lock()?
            .activities
            .iter()
            .filter(|a| search::activity_query_matches(a, query))
            .map(without_reviews)
            .collect())
    }

    async fn search_activities(&self, term: &str, limit: usize) -> CoreResult<Vec<Activity>> {
        Ok(self
            .lock()?
            .activities
            .iter()
            .filter(|a| search::activity_matches(a, term))
            .take(limit)
            .map(without_reviews)
            .collect())
    }

    async fn add_review(&self, id: ActivityId, review: &Review) -> CoreResult<Option<Activity>> {
        let mut t = self.lock()?;
        let Some(activity) = t.activities.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        apply_review(activity, review.clone());
        Ok(Some(activity.clone()))
    }
}

/// Listings carry the aggregate only, like the SQL backend.
fn without_reviews(activity: &Activity) -> Activity {
    Activity {
        reviews: Vec::new(),
        ..activity.clone()
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> CoreResult<()> {
        self.lock()?.notifications.push(notification.clone());
        Ok(())
    }

    async fn list_user_notifications(&self, user: UserId) -> CoreResult<Vec<Notification>> {
        let t = self.lock()?;
        Ok(newest_first(
            t.notifications.iter().filter(|n| n.user_id == user).cloned(),
            |n| n.created_at,
        ))
    }

    async fn unread_count(&self, user: UserId) -> CoreResult<u64> {
        Ok(self
            .lock()?
            .notifications
            .iter()
            .filter(|n| n.user_id == user && !n.read)
            .count() as u64)
    }

    async fn mark_read(&self, id: NotificationId, user: UserId) -> CoreResult<bool> {
        let mut t = self.lock()?;
        match t
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user)
        {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user: UserId) -> CoreResult<u64> {
        let mut t = self.lock()?;
        let mut changed = 0;
        for n in t
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user && !n.read)
        {
            n.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_notification(&self, id: NotificationId, user: UserId) -> CoreResult<bool> {
        let mut t = self.lock()?;
        let before = t.notifications.len();
        t.notifications.retain(|n| !(n.id == id && n.user_id == user));
        Ok(t.notifications.len() != before)
    }
}

#[async_trait]
impl UserActivityRepository for MemoryStore {
    async fn record_activity(&self, activity: &UserActivity) -> CoreResult<()> {
        self.lock()?.user_activity.push(activity.clone());
        Ok(())
    }

    async fn recent_activity(&self, user: UserId, limit: usize) -> CoreResult<Vec<UserActivity>> {
        let t = self.lock()?;
        let mut out = newest_first(
            t.user_activity.iter().filter(|a| a.user_id == user).cloned(),
            |a| a.created_at,
        );
        out.truncate(limit);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::identity::Role;
    use wayfare_core::ReviewId;
    use wayfare_shared::Money;

    fn card(user: UserId) -> PaymentMethod {
        PaymentMethod {
            id: PaymentMethodId::new(),
            user_id: user,
            processor_method_id: "pm_card_visa".to_string(),
            brand: "visa".to_string(),
            last4: "4242".to_string(),
            exp_month: 4,
            exp_year: 2031,
            is_default: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let user = User::new("Ada".into(), "Ada@Example.com".into(), "h".into(), Role::User);
        store.create_user(&user).await.unwrap();

        let again = User::new("Ada".into(), "ada@example.com ".into(), "h".into(), Role::User);
        assert!(matches!(
            store.create_user(&again).await,
            Err(CoreError::Validation(_))
        ));
        assert!(store.find_by_email("ADA@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_method_ignores_requested_default() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let first = store.insert_method(&card(user)).await.unwrap();
        let second = store.insert_method(&card(user)).await.unwrap();
        assert!(first.is_default);
        assert!(!second.is_default);

        let listed = store.list_user_methods(user).await.unwrap();
        assert_eq!(listed[0].id, first.id);
    }

    #[tokio::test]
    async fn test_concurrent_reviews_are_not_lost() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let activity = Activity {
            id: ActivityId::new(),
            destination_id: None,
            title: "Fado night".to_string(),
            category: "music".to_string(),
            description: String::new(),
            price: Money::new(3_000, "EUR"),
            rating: 0.0,
            review_count: 0,
            reviews: vec![],
            created_at: Utc::now(),
        };
        store.create_activity(&activity).await.unwrap();
        let activity_id = activity.id;

        let mut handles = Vec::new();
        for rating in [5u8, 3, 4, 4, 5, 3, 4, 4] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let review = Review {
                    id: ReviewId::new(),
                    user_id: UserId::new(),
                    author_name: "guest".to_string(),
                    rating: Some(rating),
                    comment: String::new(),
                    created_at: Utc::now(),
                };
                store.add_review(activity_id, &review).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let stored = store.get_activity(activity_id).await.unwrap().unwrap();
        assert_eq!(stored.review_count, 8);
        assert_eq!(stored.rating, 4.0);
    }

    #[tokio::test]
    async fn test_recent_activity_is_bounded() {
        let store = MemoryStore::new();
        let user = UserId::new();
        for _ in 0..5 {
            store
                .record_activity(&UserActivity {
                    id: wayfare_core::UserActivityId::new(),
                    user_id: user,
                    activity_type: wayfare_core::activity::UserActivityKind::Search,
                    destination: None,
                    category: None,
                    price: None,
                    start_date: None,
                    preferences: vec![],
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        assert_eq!(store.recent_activity(user, 3).await.unwrap().len(), 3);
    }
}
