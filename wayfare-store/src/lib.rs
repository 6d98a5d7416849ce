pub mod app_config;
pub mod database;
pub mod memory;
pub mod user_repo;
pub mod catalog_repo;
pub mod booking_repo;
pub mod payment_repo;
pub mod invoice_repo;
pub mod activity_repo;
pub mod notification_repo;
pub mod stripe;
pub mod llm;
pub mod places;
pub mod mailer;

use sqlx::PgPool;
use std::sync::Arc;
use wayfare_core::repository::{
    ActivityRepository, BookingRepository, CatalogRepository, InvoiceRepository,
    NotificationRepository, PaymentMethodRepository, PaymentRepository, TravelBookingRepository,
    UserActivityRepository, UserRepository,
};

pub use database::DbClient;
pub use memory::MemoryStore;

/// One handle per repository trait, backed by either Postgres or memory.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub travel_bookings: Arc<dyn TravelBookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub payment_methods: Arc<dyn PaymentMethodRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub user_activity: Arc<dyn UserActivityRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let bookings = Arc::new(booking_repo::StoreBookingRepository::new(pool.clone()));
        let payments = Arc::new(payment_repo::StorePaymentRepository::new(pool.clone()));
        let activities = Arc::new(activity_repo::StoreActivityRepository::new(pool.clone()));
        Self {
            users: Arc::new(user_repo::StoreUserRepository::new(pool.clone())),
            catalog: Arc::new(catalog_repo::StoreCatalogRepository::new(pool.clone())),
            bookings: bookings.clone(),
            travel_bookings: bookings,
            payments: payments.clone(),
            payment_methods: payments,
            invoices: Arc::new(invoice_repo::StoreInvoiceRepository::new(pool.clone())),
            activities: activities.clone(),
            user_activity: activities,
            notifications: Arc::new(notification_repo::StoreNotificationRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            catalog: store.clone(),
            bookings: store.clone(),
            travel_bookings: store.clone(),
            payments: store.clone(),
            payment_methods: store.clone(),
            invoices: store.clone(),
            activities: store.clone(),
            notifications: store.clone(),
            user_activity: store,
        }
    }
}

/// Map a database error into the domain error type.
pub(crate) fn storage(err: sqlx::Error) -> wayfare_core::CoreError {
    tracing::error!("Database error: {}", err);
    wayfare_core::CoreError::Storage(err.to_string())
}

/// Unique-constraint violations surface as validation errors.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// `EXCLUDE` constraint violations (SQLSTATE 23P01).
pub(crate) fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23P01"))
}

/// Columns holding counts are `INTEGER`; negative values never get written.
pub(crate) fn to_count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub(crate) fn to_int(value: u32, field: &str) -> wayfare_core::CoreResult<i32> {
    i32::try_from(value)
        .map_err(|_| wayfare_core::CoreError::validation(format!("{} is too large", field)))
}
