pub mod palindrome;

use rust_decimal::Decimal;

use crate::domain::product::{ProductRecord, ProductView};

pub use palindrome::{is_palindrome, is_palindrome_id};

/// Fraction of the full price taken off products whose id reads the same both ways.
pub const DISCOUNT_BY_PALINDROME: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

pub trait DiscountPolicy: Send + Sync {
    fn apply(&self, record: ProductRecord) -> ProductView;
}

/// Halves the price of products with a palindromic id. Title and description do not
/// participate.
#[derive(Clone, Copy, Debug, Default)]
pub struct PalindromeDiscountPolicy;

impl DiscountPolicy for PalindromeDiscountPolicy {
    fn apply(&self, record: ProductRecord) -> ProductView {
        apply_discount(record)
    }
}

pub fn price_modification_for(record: &ProductRecord) -> Decimal {
    if is_palindrome_id(record.id) {
        -DISCOUNT_BY_PALINDROME
    } else {
        Decimal::ZERO
    }
}

pub fn apply_discount(record: ProductRecord) -> ProductView {
    let price_modification = price_modification_for(&record);
    let final_price = record.full_price * (Decimal::ONE + price_modification);
    ProductView::from_record(record, final_price, price_modification)
}
