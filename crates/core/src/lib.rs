pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod service;
pub mod store;

pub use domain::product::{InvalidProductId, ProductId, ProductRecord, ProductView};
pub use errors::{CatalogError, StoreError};
pub use pricing::{
    apply_discount, is_palindrome, is_palindrome_id, DiscountPolicy, PalindromeDiscountPolicy,
    DISCOUNT_BY_PALINDROME,
};
pub use service::ProductQueryService;
pub use store::ProductStore;
