use std::collections::BTreeMap;

use async_trait::async_trait;
use catalog_core::domain::product::{ProductId, ProductRecord};
use catalog_core::errors::StoreError;
use catalog_core::store::ProductStore;
use tokio::sync::RwLock;

/// Map-backed catalog for tests and local demos. Search mirrors the SQL repository:
/// case-insensitive substring over title or description, ascending id order.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<u64, ProductRecord>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: impl IntoIterator<Item = ProductRecord>) -> Self {
        let products = products.into_iter().map(|product| (product.id.0, product)).collect();
        Self { products: RwLock::new(products) }
    }

    pub async fn save(&self, product: ProductRecord) {
        let mut products = self.products.write().await;
        products.insert(product.id.0, product);
    }
}

#[async_trait]
impl ProductStore for InMemoryProductRepository {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn search_by_text(&self, term: &str) -> Result<Vec<ProductRecord>, StoreError> {
        let needle = term.to_lowercase();
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|product| {
                product.title.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}
