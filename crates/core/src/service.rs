use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::product::{ProductId, ProductView};
use crate::errors::CatalogError;
use crate::pricing::{DiscountPolicy, PalindromeDiscountPolicy};
use crate::store::ProductStore;

/// Read-side entry point for catalog lookups.
///
/// Each call issues exactly one store request and prices every returned record with the
/// configured [`DiscountPolicy`].
pub struct ProductQueryService<P = PalindromeDiscountPolicy> {
    store: Arc<dyn ProductStore>,
    policy: P,
}

impl ProductQueryService<PalindromeDiscountPolicy> {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self::with_policy(store, PalindromeDiscountPolicy)
    }
}

impl<P: DiscountPolicy> ProductQueryService<P> {
    pub fn with_policy(store: Arc<dyn ProductStore>, policy: P) -> Self {
        Self { store, policy }
    }

    pub async fn get_by_id(&self, id: ProductId) -> Result<ProductView, CatalogError> {
        let record = match self.store.find_by_id(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(
                    event_name = "catalog.product.not_found",
                    product_id = id.0,
                    "product lookup returned no record"
                );
                return Err(CatalogError::NotFound { id });
            }
            Err(source) => {
                error!(
                    event_name = "catalog.product.store_error",
                    product_id = id.0,
                    error = %source,
                    "product lookup failed in storage"
                );
                return Err(CatalogError::internal(format!("failed to fetch product {id}"), source));
            }
        };

        let view = self.policy.apply(record);
        debug!(
            event_name = "catalog.product.priced",
            product_id = id.0,
            final_price = %view.final_price,
            price_modification = %view.price_modification,
            "product priced"
        );
        Ok(view)
    }

    pub async fn search_by_text(&self, term: &str) -> Result<Vec<ProductView>, CatalogError> {
        let records = self.store.search_by_text(term).await.map_err(|source| {
            error!(
                event_name = "catalog.search.store_error",
                term = %term,
                error = %source,
                "product search failed in storage"
            );
            CatalogError::internal(format!("failed to search products matching `{term}`"), source)
        })?;

        debug!(
            event_name = "catalog.search.completed",
            term = %term,
            matches = records.len(),
            "product search completed"
        );
        Ok(records.into_iter().map(|record| self.policy.apply(record)).collect())
    }
}
