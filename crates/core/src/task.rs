//! Task data: auxiliary, domain-specific payloads attached to a request.

use async_trait::async_trait;

use crate::error::TaskDataError;

/// Loads the raw payload (an invoice, a product record...) that a request
/// refers to. `Ok(None)` means the input references nothing loadable.
#[async_trait]
pub trait TaskDataSource: Send + Sync {
    async fn load(
        &self,
        domain_id: &str,
        user_input: &str,
    ) -> Result<Option<serde_json::Value>, TaskDataError>;
}
