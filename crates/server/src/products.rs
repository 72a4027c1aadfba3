//! Product endpoints:
//! - `GET /api/products/{id}`             priced product by numeric id
//! - `GET /api/products/search?q={term}`  priced products matching free text

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, Request},
    response::Response,
};
use catalog_core::{CatalogError, ProductId, ProductQueryService};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::envelope::{self, ProductResource};
use crate::router::{Handler, PathParams};

pub const PRODUCT_BY_ID_PATTERN: &str = "/api/products/([0-9]+)";
pub const PRODUCT_SEARCH_PATTERN: &str = "/api/products/search";

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Clone)]
pub struct ProductRoutes {
    service: Arc<ProductQueryService>,
    request_timeout: Duration,
}

impl ProductRoutes {
    pub fn new(service: Arc<ProductQueryService>, request_timeout: Duration) -> Self {
        Self { service, request_timeout }
    }

    pub fn by_id_handler(&self) -> impl Handler {
        let routes = self.clone();
        move |request: Request| {
            let routes = routes.clone();
            async move { routes.get_by_id(request).await }
        }
    }

    pub fn search_handler(&self) -> impl Handler {
        let routes = self.clone();
        move |request: Request| {
            let routes = routes.clone();
            async move { routes.search(request).await }
        }
    }

    pub async fn get_by_id(&self, request: Request) -> Response {
        let raw = PathParams::of(&request).and_then(PathParams::first).unwrap_or_default();
        let id = match raw.parse::<ProductId>() {
            Ok(id) => id,
            Err(reason) => {
                warn!(
                    event_name = "http.products.invalid_id",
                    raw_id = %raw,
                    reason = %reason,
                    "rejecting product lookup"
                );
                return envelope::from_error(&CatalogError::Validation(format!(
                    "invalid product id path parameter sent: received: {raw}"
                )));
            }
        };

        info!(event_name = "http.products.get_by_id", product_id = id.0, "received product lookup");
        match self.with_deadline(self.service.get_by_id(id)).await {
            Ok(view) => envelope::success(ProductResource::from(view)),
            Err(error) => envelope::from_error(&error),
        }
    }

    pub async fn search(&self, request: Request) -> Response {
        let term = match Query::<SearchParams>::try_from_uri(request.uri()) {
            Ok(Query(SearchParams { q: Some(term) })) => term,
            Ok(Query(SearchParams { q: None })) => {
                return envelope::from_error(&CatalogError::Validation(
                    "missing search term query parameter `q`".to_string(),
                ));
            }
            Err(rejection) => {
                warn!(
                    event_name = "http.products.invalid_query",
                    error = %rejection,
                    "rejecting product search"
                );
                return envelope::from_error(&CatalogError::Validation(format!(
                    "invalid search query: {rejection}"
                )));
            }
        };

        info!(event_name = "http.products.search", term = %term, "received product search");
        match self.with_deadline(self.service.search_by_text(&term)).await {
            Ok(views) => envelope::success(
                views.into_iter().map(ProductResource::from).collect::<Vec<_>>(),
            ),
            Err(error) => envelope::from_error(&error),
        }
    }

    /// Dropping `operation` on expiry abandons the in-flight storage call.
    async fn with_deadline<T>(
        &self,
        operation: impl Future<Output = Result<T, CatalogError>>,
    ) -> Result<T, CatalogError> {
        match tokio::time::timeout(self.request_timeout, operation).await {
            Ok(result) => result,
            Err(elapsed) => {
                error!(
                    event_name = "http.products.deadline_exceeded",
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "product request exceeded its deadline"
                );
                Err(CatalogError::internal("request deadline exceeded", elapsed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::{self, StatusCode},
        response::Response,
    };
    use catalog_core::{
        ProductId, ProductQueryService, ProductRecord, ProductStore, StoreError,
    };
    use catalog_db::InMemoryProductRepository;
    use rust_decimal::Decimal;
    use serde_json::Value;

    use super::{ProductRoutes, PRODUCT_BY_ID_PATTERN, PRODUCT_SEARCH_PATTERN};
    use crate::router::PathRouter;

    fn product(id: u64, title: &str) -> ProductRecord {
        ProductRecord {
            id: ProductId(id),
            title: title.to_string(),
            description: String::new(),
            image_url: format!("www.lider.cl/catalogo/images/{id}.svg"),
            full_price: Decimal::from(1000),
        }
    }

    fn router_over(store: Arc<dyn ProductStore>, timeout: Duration) -> PathRouter {
        let routes = ProductRoutes::new(Arc::new(ProductQueryService::new(store)), timeout);
        PathRouter::builder()
            .route(http::Method::GET, PRODUCT_BY_ID_PATTERN, routes.by_id_handler())
            .expect("id pattern")
            .route(http::Method::GET, PRODUCT_SEARCH_PATTERN, routes.search_handler())
            .expect("search pattern")
            .build()
    }

    fn catalog_router() -> PathRouter {
        let store = InMemoryProductRepository::with_products([
            product(123, "lavadora"),
            product(181, "lavadora premium"),
        ]);
        router_over(Arc::new(store), Duration::from_secs(5))
    }

    fn get(uri: &str) -> Request {
        http::Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    struct StalledStore;

    #[async_trait]
    impl ProductStore for StalledStore {
        async fn find_by_id(&self, _id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
            std::future::pending().await
        }

        async fn search_by_text(&self, _term: &str) -> Result<Vec<ProductRecord>, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn get_by_id_returns_discounted_product() {
        let response = catalog_router().dispatch(get("/api/products/181")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "");
        assert_eq!(payload["resources"]["id"], 181);
        assert_eq!(payload["resources"]["finalPrice"], 500.0);
        assert_eq!(payload["resources"]["priceModifications"], -0.5);
    }

    #[tokio::test]
    async fn get_by_id_returns_full_price_for_non_palindrome() {
        let response = catalog_router().dispatch(get("/api/products/123")).await;

        let payload = json_body(response).await;
        assert_eq!(payload["resources"]["fullPrice"], 1000.0);
        assert_eq!(payload["resources"]["finalPrice"], 1000.0);
        assert_eq!(payload["resources"]["priceModifications"], 0.0);
    }

    #[tokio::test]
    async fn zero_id_is_rejected_with_400() {
        let response = catalog_router().dispatch(get("/api/products/0")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "invalid product id path parameter sent: received: 0");
    }

    #[tokio::test]
    async fn out_of_range_id_is_rejected_with_400() {
        let response =
            catalog_router().dispatch(get("/api/products/123456789012345678901234567890")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn absent_id_returns_500_with_not_found_message() {
        let response = catalog_router().dispatch(get("/api/products/55")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "no products found with id: 55");
        assert!(payload.get("resources").is_none());
    }

    #[tokio::test]
    async fn search_returns_priced_collection_in_store_order() {
        let response = catalog_router().dispatch(get("/api/products/search?q=lavadora")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        let resources = payload["resources"].as_array().expect("array of products");
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0]["id"], 123);
        assert_eq!(resources[0]["finalPrice"], 1000.0);
        assert_eq!(resources[1]["id"], 181);
        assert_eq!(resources[1]["finalPrice"], 500.0);
    }

    #[tokio::test]
    async fn search_without_matches_is_an_empty_success() {
        let response = catalog_router().dispatch(get("/api/products/search?q=microondas")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "");
        assert_eq!(payload["resources"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn search_decodes_percent_encoded_terms() {
        let response =
            catalog_router().dispatch(get("/api/products/search?q=LAVADORA%20premium")).await;

        let payload = json_body(response).await;
        let resources = payload["resources"].as_array().expect("array of products");
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0]["id"], 181);
    }

    #[tokio::test]
    async fn search_without_term_is_rejected_with_400() {
        let response = catalog_router().dispatch(get("/api/products/search")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "missing search term query parameter `q`");
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_storage_is_abandoned_at_the_deadline() {
        let router = router_over(Arc::new(StalledStore), Duration::from_millis(50));

        let response = router.dispatch(get("/api/products/181")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "an internal error occurred");
    }
}
