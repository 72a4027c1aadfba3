use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Externally assigned catalog key. Always strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidProductId {
    #[error("product id `{0}` is not a non-negative integer")]
    NotNumeric(String),
    #[error("product id must be greater than zero")]
    Zero,
}

impl FromStr for ProductId {
    type Err = InvalidProductId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(InvalidProductId::NotNumeric(value.to_string()));
        }

        match trimmed.parse::<u64>() {
            Ok(0) => Err(InvalidProductId::Zero),
            Ok(id) => Ok(Self(id)),
            Err(_) => Err(InvalidProductId::NotNumeric(value.to_string())),
        }
    }
}

/// A product exactly as the storage backend returns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub full_price: Decimal,
}

/// A priced product handed back to callers.
///
/// `final_price == full_price * (1 + price_modification)` holds for every view built by a
/// [`crate::pricing::DiscountPolicy`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub full_price: Decimal,
    pub final_price: Decimal,
    pub price_modification: Decimal,
}

impl ProductView {
    pub fn from_record(
        record: ProductRecord,
        final_price: Decimal,
        price_modification: Decimal,
    ) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            image_url: record.image_url,
            full_price: record.full_price,
            final_price,
            price_modification,
        }
    }
}
