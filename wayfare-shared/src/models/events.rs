use crate::money::Money;
use uuid::Uuid;

/// State changes that users get notified about.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingCreated {
        booking_id: Uuid,
        user_id: Uuid,
        total: Money,
    },
    BookingConfirmed {
        booking_id: Uuid,
        user_id: Uuid,
    },
    BookingCancelled {
        booking_id: Uuid,
        user_id: Uuid,
    },
    TravelBookingCreated {
        booking_id: Uuid,
        user_id: Uuid,
        target_kind: String,
        total: Money,
    },
    TravelBookingCancelled {
        booking_id: Uuid,
        user_id: Uuid,
    },
    PaymentCompleted {
        payment_id: Uuid,
        user_id: Uuid,
        amount: Money,
    },
    PaymentFailed {
        payment_id: Uuid,
        user_id: Uuid,
    },
    PaymentRefunded {
        payment_id: Uuid,
        user_id: Uuid,
        amount: Money,
        refund_id: String,
    },
}

impl DomainEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            DomainEvent::BookingCreated { user_id, .. }
            | DomainEvent::BookingConfirmed { user_id, .. }
            | DomainEvent::BookingCancelled { user_id, .. }
            | DomainEvent::TravelBookingCreated { user_id, .. }
            | DomainEvent::TravelBookingCancelled { user_id, .. }
            | DomainEvent::PaymentCompleted { user_id, .. }
            | DomainEvent::PaymentFailed { user_id, .. }
            | DomainEvent::PaymentRefunded { user_id, .. } => *user_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::BookingCreated { .. } => "booking_created",
            DomainEvent::BookingConfirmed { .. } => "booking_confirmed",
            DomainEvent::BookingCancelled { .. } => "booking_cancelled",
            DomainEvent::TravelBookingCreated { .. } => "travel_booking_created",
            DomainEvent::TravelBookingCancelled { .. } => "travel_booking_cancelled",
            DomainEvent::PaymentCompleted { .. } => "payment_completed",
            DomainEvent::PaymentFailed { .. } => "payment_failed",
            DomainEvent::PaymentRefunded { .. } => "payment_refunded",
        }
    }
}

/// Pushed to live subscribers (server-sent events) after a notification is stored.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct NotificationPushed {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub created_at: i64,
}
