use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wayfare_shared::Money;

use crate::{BookingId, CoreError, InvoiceId, PaymentId, UserId};

/// `draft -> issued -> paid`, and any non-void invoice can be voided.
/// Not driven by the payment's status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Issued,
        InvoiceStatus::Paid,
        InvoiceStatus::Void,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }

    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Draft, InvoiceStatus::Issued)
                | (InvoiceStatus::Issued, InvoiceStatus::Paid)
                | (InvoiceStatus::Draft, InvoiceStatus::Void)
                | (InvoiceStatus::Issued, InvoiceStatus::Void)
                | (InvoiceStatus::Paid, InvoiceStatus::Void)
        )
    }

    pub fn sources_of(next: InvoiceStatus) -> Vec<InvoiceStatus> {
        Self::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "issued" => Ok(InvoiceStatus::Issued),
            "paid" => Ok(InvoiceStatus::Paid),
            "void" => Ok(InvoiceStatus::Void),
            other => Err(CoreError::validation(format!("unknown invoice status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub booking_id: BookingId,
    pub number: String,
    pub amount: Money,
    pub status: InvoiceStatus,
    pub issued_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub voided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_is_terminal() {
        for next in InvoiceStatus::ALL {
            assert!(!InvoiceStatus::Void.can_transition_to(next));
        }
    }

    #[test]
    fn test_paid_requires_issued() {
        assert_eq!(InvoiceStatus::sources_of(InvoiceStatus::Paid), vec![InvoiceStatus::Issued]);
        assert!(!InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Paid));
    }
}
