use chrono::Utc;
use std::sync::Arc;
use wayfare_core::payment::{PaymentAdapter, PaymentMethod};
use wayfare_core::repository::PaymentMethodRepository;
use wayfare_core::{CoreError, CoreResult, PaymentMethodId, UserId};

/// Saved cards. Every user with at least one card has exactly one default.
pub struct PaymentMethodService {
    adapter: Arc<dyn PaymentAdapter>,
    methods: Arc<dyn PaymentMethodRepository>,
}

impl PaymentMethodService {
    pub fn new(adapter: Arc<dyn PaymentAdapter>, methods: Arc<dyn PaymentMethodRepository>) -> Self {
        Self { adapter, methods }
    }

    /// Save a card tokenized by the frontend; the first card becomes default.
    pub async fn add_method(
        &self,
        user_id: UserId,
        processor_method_id: &str,
    ) -> CoreResult<PaymentMethod> {
        let processor_method_id = processor_method_id.trim();
        if processor_method_id.is_empty() {
            return Err(CoreError::validation("paymentMethodId is required"));
        }

        let card = self.adapter.retrieve_method(processor_method_id).await?;
        let method = self
            .methods
            .insert_method(&PaymentMethod {
                id: PaymentMethodId::new(),
                user_id,
                processor_method_id: card.id,
                brand: card.brand,
                last4: card.last4,
                exp_month: card.exp_month,
                exp_year: card.exp_year,
                is_default: false,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            "Payment method {} saved ({} ending {}, default: {})",
            method.id,
            method.brand,
            method.last4,
            method.is_default
        );
        Ok(method)
    }

    pub async fn list_methods(&self, user_id: UserId) -> CoreResult<Vec<PaymentMethod>> {
        self.methods.list_user_methods(user_id).await
    }

    /// Delete a card. Removing the default promotes the newest remaining card.
    pub async fn remove_method(&self, user_id: UserId, id: PaymentMethodId) -> CoreResult<()> {
        let method = self
            .methods
            .get_user_method(id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment method not found"))?;

        if !self.methods.delete_method(id, user_id).await? {
            return Err(CoreError::not_found("Payment method not found"));
        }

        if method.is_default {
            // With no default left the listing is newest first.
            let remaining = self.methods.list_user_methods(user_id).await?;
            if let Some(next) = remaining.first().filter(|m| !m.is_default) {
                self.methods.set_default_method(next.id, user_id).await?;
                tracing::info!("Payment method {} promoted to default", next.id);
            }
        }
        Ok(())
    }

    /// Make `id` the caller's only default. Returns the updated list.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: PaymentMethodId,
    ) -> CoreResult<Vec<PaymentMethod>> {
        if !self.methods.set_default_method(id, user_id).await? {
            return Err(CoreError::not_found("Payment method not found"));
        }
        tracing::info!("Payment method {} is now default", id);
        self.methods.list_user_methods(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::MockPaymentAdapter;
    use wayfare_store::memory::MemoryStore;

    fn service() -> PaymentMethodService {
        let store = Arc::new(MemoryStore::new());
        PaymentMethodService::new(Arc::new(MockPaymentAdapter::new()), store)
    }

    fn defaults(methods: &[PaymentMethod]) -> Vec<PaymentMethodId> {
        methods.iter().filter(|m| m.is_default).map(|m| m.id).collect()
    }

    #[tokio::test]
    async fn test_first_card_is_default() {
        let service = service();
        let user = UserId::new();
        let first = service.add_method(user, "pm_card_visa").await.unwrap();
        let second = service.add_method(user, "pm_card_mastercard").await.unwrap();

        assert!(first.is_default);
        assert!(!second.is_default);
        assert_eq!(second.brand, "mastercard");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_cards_yield_one_default() {
        let service = Arc::new(service());
        let user = UserId::new();
        let adds: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.add_method(user, "pm_card_visa").await })
            })
            .collect();
        for add in adds {
            add.await.unwrap().unwrap();
        }

        let listed = service.list_methods(user).await.unwrap();
        assert_eq!(listed.len(), 8);
        assert_eq!(defaults(&listed).len(), 1);
    }

    #[tokio::test]
    async fn test_set_default_leaves_exactly_one() {
        let service = service();
        let user = UserId::new();
        let mut ids = Vec::new();
        for card in ["pm_card_visa", "pm_card_mastercard", "pm_card_amex"] {
            ids.push(service.add_method(user, card).await.unwrap().id);
        }

        for id in [ids[2], ids[1], ids[1], ids[0]] {
            let listed = service.set_default(user, id).await.unwrap();
            assert_eq!(defaults(&listed), vec![id]);
            assert_eq!(listed[0].id, id);
        }
    }

    #[tokio::test]
    async fn test_set_default_of_foreign_card_changes_nothing() {
        let service = service();
        let owner = UserId::new();
        let mine = service.add_method(owner, "pm_card_visa").await.unwrap();
        let other = service.add_method(UserId::new(), "pm_card_visa").await.unwrap();

        let err = service.set_default(owner, other.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        let listed = service.list_methods(owner).await.unwrap();
        assert_eq!(defaults(&listed), vec![mine.id]);
    }

    #[tokio::test]
    async fn test_removing_default_promotes_newest() {
        let service = service();
        let user = UserId::new();
        let first = service.add_method(user, "pm_card_visa").await.unwrap();
        service.add_method(user, "pm_card_mastercard").await.unwrap();
        let newest = service.add_method(user, "pm_card_amex").await.unwrap();

        service.remove_method(user, first.id).await.unwrap();
        let listed = service.list_methods(user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(defaults(&listed), vec![newest.id]);
    }
}
