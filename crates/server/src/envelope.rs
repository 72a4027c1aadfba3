use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_core::{CatalogError, ProductView};
use rust_decimal::Decimal;
use serde::Serialize;

/// Uniform response body: `error` is empty on success, `resources` is omitted on failure.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(resources: T) -> Self {
        Self { error: String::new(), resources: Some(resources) }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResource {
    pub id: u64,
    pub title: String,
    pub description: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub full_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_modifications: Decimal,
}

impl From<ProductView> for ProductResource {
    fn from(view: ProductView) -> Self {
        Self {
            id: view.id.0,
            title: view.title,
            description: view.description,
            image_url: view.image_url,
            full_price: view.full_price,
            final_price: view.final_price,
            price_modifications: view.price_modification,
        }
    }
}

pub fn success<T: Serialize>(resources: T) -> Response {
    (StatusCode::OK, Json(Envelope::ok(resources))).into_response()
}

pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body: Envelope<()> = Envelope { error: message.into(), resources: None };
    (status, Json(body)).into_response()
}

/// Not-found and internal failures share 500; only validation maps to 400.
pub fn status_for(error: &CatalogError) -> StatusCode {
    match error {
        CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
        CatalogError::NotFound { .. } | CatalogError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn from_error(error: &CatalogError) -> Response {
    failure(status_for(error), error.user_message())
}
