use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Products inserted by [`ProductFixtures::SQL`], in id order.
const SEED_PRODUCTS: &[SeededProduct] = &[
    SeededProduct { id: 1, title: "ooy eqrceli", discounted: true },
    SeededProduct { id: 11, title: "dsaasd", discounted: true },
    SeededProduct { id: 123, title: "a random product", discounted: false },
    SeededProduct { id: 181, title: "a palindromic(?) product", discounted: true },
    SeededProduct { id: 1221, title: "lavadora carga frontal", discounted: true },
    SeededProduct { id: 2045, title: "secadora", discounted: false },
];

/// Deterministic demo catalog covering both discounted and full-price products.
pub struct ProductFixtures;

impl ProductFixtures {
    pub const SQL: &str = include_str!("../../../config/fixtures/catalog_seed.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult { products_seeded: SEED_PRODUCTS.to_vec() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        verify_products(pool, SEED_PRODUCTS).await
    }
}

async fn verify_products(
    pool: &DbPool,
    products: &[SeededProduct],
) -> Result<VerificationResult, RepositoryError> {
    let mut checks = Vec::with_capacity(products.len());

    for product in products {
        let id = i64::try_from(product.id).map_err(|_| {
            RepositoryError::Decode(format!("seed product id `{}` does not fit in i64", product.id))
        })?;
        let present: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM product WHERE id = ?1 AND title = ?2)")
                .bind(id)
                .bind(product.title)
                .fetch_one(pool)
                .await?;
        checks.push((product.id, present == 1));
    }

    let all_present = checks.iter().all(|(_, passed)| *passed);
    Ok(VerificationResult { all_present, checks })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeededProduct {
    pub id: u64,
    pub title: &'static str,
    pub discounted: bool,
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: Vec<SeededProduct>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(u64, bool)>,
}
