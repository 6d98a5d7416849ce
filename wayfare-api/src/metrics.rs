use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{IntCounter, Registry, TextEncoder};

use crate::{error::AppError, state::AppState};

/// Business counters served at `/metrics`.
pub struct Metrics {
    registry: Registry,
    pub bookings_created: IntCounter,
    pub bookings_cancelled: IntCounter,
    pub payment_intents: IntCounter,
    pub refunds: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            let c = IntCounter::new(name, help)?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };

        Ok(Self {
            bookings_created: counter("wayfare_bookings_created_total", "Bookings created")?,
            bookings_cancelled: counter("wayfare_bookings_cancelled_total", "Bookings cancelled")?,
            payment_intents: counter("wayfare_payment_intents_total", "Payment intents created")?,
            refunds: counter("wayfare_refunds_total", "Payments refunded")?,
            registry,
        })
    }

    pub fn export(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.export()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_exported() {
        let metrics = Metrics::new().unwrap();
        metrics.refunds.inc();
        let text = metrics.export().unwrap();
        assert!(text.contains("wayfare_refunds_total 1"));
        assert!(text.contains("wayfare_bookings_created_total 0"));
    }
}
