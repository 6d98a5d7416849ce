use std::sync::Arc;
use tokio::sync::broadcast;
use wayfare_core::mailer::{Email, Mailer};
use wayfare_core::notification::Notification;
use wayfare_core::repository::{NotificationRepository, UserRepository};
use wayfare_core::UserId;
use wayfare_shared::models::events::{DomainEvent, NotificationPushed};

const LIVE_CHANNEL_CAPACITY: usize = 256;

/// Turns domain events into stored notifications, pushes them to live
/// subscribers and sends the emails that go with them.
///
/// Delivery is best effort: a failed insert or email is logged and never
/// fails the request that produced the event.
pub struct Notifier {
    notifications: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    live: broadcast::Sender<NotificationPushed>,
}

impl Notifier {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            notifications,
            users,
            mailer,
            live,
        }
    }

    /// Every notification stored from now on, for all users. Subscribers
    /// filter by `user_id`.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationPushed> {
        self.live.subscribe()
    }

    pub async fn publish(&self, event: DomainEvent) {
        let user_id = UserId::from(event.user_id());
        let (title, message) = describe(&event);
        let notification = Notification::new(user_id, event.kind(), title, message);

        if let Err(e) = self.notifications.insert_notification(&notification).await {
            tracing::error!("Failed to store {} notification: {}", event.kind(), e);
            return;
        }

        // No receivers is the normal case when nobody has a stream open.
        let _ = self.live.send(NotificationPushed {
            notification_id: notification.id.as_uuid(),
            user_id: user_id.as_uuid(),
            kind: notification.kind.clone(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            created_at: notification.created_at.timestamp(),
        });

        if wants_email(&event) {
            self.email(user_id, &notification).await;
        }
    }

    async fn email(&self, user_id: UserId, notification: &Notification) {
        let user = match self.users.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("No user {} to email about {}", user_id, notification.kind);
                return;
            }
            Err(e) => {
                tracing::error!("Failed to load user {} for email: {}", user_id, e);
                return;
            }
        };

        let email = Email {
            to: user.email.clone(),
            subject: notification.title.clone(),
            body: format!("Hi {},\n\n{}\n", user.name, notification.message),
        };
        if let Err(e) = self.mailer.send(&email).await {
            tracing::error!("Failed to send {} email to {}: {}", notification.kind, email.to, e);
        }
    }
}

fn wants_email(event: &DomainEvent) -> bool {
    matches!(
        event,
        DomainEvent::BookingConfirmed { .. }
            | DomainEvent::PaymentCompleted { .. }
            | DomainEvent::PaymentRefunded { .. }
    )
}

fn describe(event: &DomainEvent) -> (String, String) {
    match event {
        DomainEvent::BookingCreated { booking_id, total, .. } => (
            "Booking received".to_string(),
            format!("Your booking {} for {} is pending confirmation.", booking_id, total),
        ),
        DomainEvent::BookingConfirmed { booking_id, .. } => (
            "Booking confirmed".to_string(),
            format!("Your booking {} has been confirmed.", booking_id),
        ),
        DomainEvent::BookingCancelled { booking_id, .. } => (
            "Booking cancelled".to_string(),
            format!("Your booking {} has been cancelled.", booking_id),
        ),
        DomainEvent::TravelBookingCreated {
            booking_id,
            target_kind,
            total,
            ..
        } => (
            format!("{} booking received", capitalize(target_kind)),
            format!("Your {} booking {} for {} is pending.", target_kind, booking_id, total),
        ),
        DomainEvent::TravelBookingCancelled { booking_id, .. } => (
            "Travel booking cancelled".to_string(),
            format!("Your travel booking {} has been cancelled.", booking_id),
        ),
        DomainEvent::PaymentCompleted { payment_id, amount, .. } => (
            "Payment received".to_string(),
            format!("We received your payment {} of {}.", payment_id, amount),
        ),
        DomainEvent::PaymentFailed { payment_id, .. } => (
            "Payment failed".to_string(),
            format!("Your payment {} could not be completed.", payment_id),
        ),
        DomainEvent::PaymentRefunded {
            payment_id,
            amount,
            refund_id,
            ..
        } => (
            "Refund issued".to_string(),
            format!(
                "Payment {} of {} was refunded (reference {}).",
                payment_id, amount, refund_id
            ),
        ),
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wayfare_core::identity::{Role, User};
    use wayfare_core::CoreResult;
    use wayfare_store::memory::MemoryStore;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> CoreResult<()> {
            self.sent.lock().unwrap().push(email.subject.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_stores_broadcasts_and_emails() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::new(store.clone(), store.clone(), mailer.clone());

        let user = User::new("Ada".into(), "ada@example.com".into(), "x".into(), Role::User);
        store.create_user(&user).await.unwrap();

        let mut rx = notifier.subscribe();
        notifier
            .publish(DomainEvent::BookingConfirmed {
                booking_id: uuid::Uuid::new_v4(),
                user_id: user.id.as_uuid(),
            })
            .await;

        let stored = store.list_user_notifications(user.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, "booking_confirmed");
        assert!(!stored[0].read);

        let pushed = rx.recv().await.unwrap();
        assert_eq!(pushed.user_id, user.id.as_uuid());
        assert_eq!(mailer.sent.lock().unwrap().as_slice(), ["Booking confirmed"]);
    }

    #[tokio::test]
    async fn test_created_event_sends_no_email() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::new(store.clone(), store.clone(), mailer.clone());

        notifier
            .publish(DomainEvent::BookingCreated {
                booking_id: uuid::Uuid::new_v4(),
                user_id: uuid::Uuid::new_v4(),
                total: wayfare_shared::Money::new(100, "USD"),
            })
            .await;

        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}
