use async_trait::async_trait;
use wayfare_shared::Masked;

use crate::CoreResult;

#[derive(Debug, Clone)]
pub struct Email {
    pub to: Masked<String>,
    pub subject: String,
    pub body: String,
}

/// Outbound email relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> CoreResult<()>;
}
