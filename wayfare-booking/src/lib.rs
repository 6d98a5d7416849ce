pub mod notifier;
pub mod lifecycle;
pub mod travel;
pub mod orchestrator;
pub mod methods;
pub mod invoice;

pub use notifier::Notifier;
pub use lifecycle::{BookingError, BookingService, NewBooking};
pub use travel::{NewTravelBooking, TravelBookingService};
pub use orchestrator::{MockPaymentAdapter, PaymentIntentCreated, PaymentOrchestrator};
pub use methods::PaymentMethodService;
pub use invoice::{InvoiceError, InvoiceService};
