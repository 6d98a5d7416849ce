pub mod availability;
pub mod inventory;
pub mod pricing;
pub mod rating;
pub mod search;

pub use availability::DateRange;
pub use inventory::Bookable;
pub use pricing::quote_stay;
pub use rating::{apply_review, average_rating};

use wayfare_core::CoreError;

/// Catalog-related errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("End date {end} must be after start date {start}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("An end date is required when booking a {0}")]
    MissingEndDate(&'static str),

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Not enough availability for this {kind}: requested {requested}, remaining {remaining}")]
    SoldOut {
        kind: &'static str,
        requested: u32,
        remaining: u32,
    },

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Price calculation overflowed")]
    PriceOverflow,
}

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::SoldOut { .. } => CoreError::InvalidState(err.to_string()),
            other => CoreError::Validation(other.to_string()),
        }
    }
}
