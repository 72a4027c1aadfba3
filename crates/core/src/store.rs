use async_trait::async_trait;

use crate::domain::product::{ProductId, ProductRecord};
use crate::errors::StoreError;

/// Read access to the product catalog backing store.
///
/// Implementations must not retry internally. Callers cancel a pending lookup by dropping
/// the returned future.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// `Ok(None)` means no record carries `id`.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError>;

    /// Records whose text matches `term`, in store order. An empty vector is a valid answer.
    async fn search_by_text(&self, term: &str) -> Result<Vec<ProductRecord>, StoreError>;
}
