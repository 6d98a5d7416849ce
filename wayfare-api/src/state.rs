use std::sync::Arc;
use wayfare_booking::{
    BookingService, InvoiceService, Notifier, PaymentMethodService, PaymentOrchestrator,
    TravelBookingService,
};
use wayfare_core::assistant::Assistant;
use wayfare_core::mailer::Mailer;
use wayfare_core::payment::PaymentAdapter;
use wayfare_core::places::PlacesProvider;
use wayfare_insights::TravelAdvisor;
use wayfare_shared::Masked;
use wayfare_store::Repositories;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
    pub expiration: u64,
}

/// External collaborators chosen at startup.
pub struct Collaborators {
    pub payments: Arc<dyn PaymentAdapter>,
    pub assistant: Arc<dyn Assistant>,
    pub places: Arc<dyn PlacesProvider>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub notifier: Arc<Notifier>,
    pub bookings: Arc<BookingService>,
    pub travel: Arc<TravelBookingService>,
    pub payments: Arc<PaymentOrchestrator>,
    pub payment_methods: Arc<PaymentMethodService>,
    pub invoices: Arc<InvoiceService>,
    pub advisor: Arc<TravelAdvisor>,
    pub places: Arc<dyn PlacesProvider>,
    pub metrics: Arc<Metrics>,
    pub auth: AuthConfig,
    /// Recent activity records folded into a preference profile.
    pub history_limit: usize,
}

impl AppState {
    /// Wire every service onto one set of repositories.
    pub fn new(
        repos: Repositories,
        collaborators: Collaborators,
        auth: AuthConfig,
        history_limit: usize,
    ) -> anyhow::Result<Self> {
        let notifier = Arc::new(Notifier::new(
            repos.notifications.clone(),
            repos.users.clone(),
            collaborators.mailer,
        ));

        Ok(Self {
            bookings: Arc::new(BookingService::new(
                repos.catalog.clone(),
                repos.bookings.clone(),
                notifier.clone(),
            )),
            travel: Arc::new(TravelBookingService::new(
                repos.catalog.clone(),
                repos.travel_bookings.clone(),
                notifier.clone(),
            )),
            payments: Arc::new(PaymentOrchestrator::new(
                collaborators.payments.clone(),
                repos.bookings.clone(),
                repos.payment_methods.clone(),
                repos.payments.clone(),
                notifier.clone(),
            )),
            payment_methods: Arc::new(PaymentMethodService::new(
                collaborators.payments,
                repos.payment_methods.clone(),
            )),
            invoices: Arc::new(InvoiceService::new(
                repos.payments.clone(),
                repos.invoices.clone(),
            )),
            advisor: Arc::new(TravelAdvisor::new(collaborators.assistant)),
            places: collaborators.places,
            metrics: Arc::new(Metrics::new()?),
            notifier,
            repos,
            auth,
            history_limit,
        })
    }
}
