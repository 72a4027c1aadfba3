use std::str::FromStr;

use async_trait::async_trait;
use catalog_core::domain::product::{ProductId, ProductRecord};
use catalog_core::errors::StoreError;
use catalog_core::store::ProductStore;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use super::RepositoryError;
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, title, description, image_url, full_price";

/// SQLite-backed product catalog.
///
/// Prices are stored as TEXT so that decimal values survive the round trip exactly.
/// Text search is a case-insensitive substring match over title and description,
/// ordered by id.
pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Ids above `i64::MAX` cannot be stored, so they are simply absent.
    pub async fn find(&self, id: ProductId) -> Result<Option<ProductRecord>, RepositoryError> {
        let Ok(sql_id) = i64::try_from(id.0) else {
            return Ok(None);
        };
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
            .bind(sql_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(decode_product).transpose()
    }

    pub async fn search(&self, term: &str) -> Result<Vec<ProductRecord>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(term));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM product
            WHERE title LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\'
            ORDER BY id ASC
            "#
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_product).collect()
    }

    /// Inserts or replaces a product keyed by id.
    pub async fn save(&self, product: &ProductRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO product (id, title, description, image_url, full_price)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                image_url = excluded.image_url,
                full_price = excluded.full_price
            "#,
        )
        .bind(to_sql_id(product.id)?)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.full_price.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProductStore for SqlProductRepository {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self.find(id).await?)
    }

    async fn search_by_text(&self, term: &str) -> Result<Vec<ProductRecord>, StoreError> {
        Ok(self.search(term).await?)
    }
}

fn to_sql_id(id: ProductId) -> Result<i64, RepositoryError> {
    i64::try_from(id.0)
        .map_err(|_| RepositoryError::Decode(format!("product id `{id}` does not fit in i64")))
}

fn decode_product(row: &SqliteRow) -> Result<ProductRecord, RepositoryError> {
    let raw_id: i64 = row.try_get("id")?;
    let id = u64::try_from(raw_id)
        .ok()
        .filter(|id| *id > 0)
        .map(ProductId)
        .ok_or_else(|| RepositoryError::Decode(format!("product id `{raw_id}` is not positive")))?;

    let raw_price: String = row.try_get("full_price")?;
    let full_price = Decimal::from_str(raw_price.trim()).map_err(|error| {
        RepositoryError::Decode(format!(
            "full_price `{raw_price}` of product {id} is not a decimal: {error}"
        ))
    })?;
    if full_price.is_sign_negative() {
        return Err(RepositoryError::Decode(format!(
            "full_price `{raw_price}` of product {id} is negative"
        )));
    }

    Ok(ProductRecord {
        id,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        full_price,
    })
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
