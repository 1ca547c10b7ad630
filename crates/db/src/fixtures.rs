use sqlx::Executor;
use tracing::info;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Date the demo movements are laid out against. Analysing with any other
/// reference date shifts products between categories.
pub const DEMO_REFERENCE_DATE: &str = "2025-06-30";

/// One seeded product and the shape of its data.
struct DemoProductContract {
    product_code: &'static str,
    expected_category: &'static str,
    movement_count: i64,
    on_hand: f64,
    movements_label: &'static str,
    position_label: &'static str,
    description: &'static str,
}

const DEMO_PRODUCTS: &[DemoProductContract] = &[
    DemoProductContract {
        product_code: "KABLO-NYA-3X2.5",
        expected_category: "REGULAR",
        movement_count: 28,
        on_hand: 80.0,
        movements_label: "kablo-movements",
        position_label: "kablo-position",
        description: "cable sold twice a month all year, one return and one count correction",
    },
    DemoProductContract {
        product_code: "JENERATOR-5KVA",
        expected_category: "DEMAND_DRIVEN",
        movement_count: 2,
        on_hand: 0.0,
        movements_label: "jenerator-movements",
        position_label: "jenerator-position",
        description: "generator bought in and sold once against a customer order",
    },
    DemoProductContract {
        product_code: "PANO-OZEL-120",
        expected_category: "SPECIAL_ORDER",
        movement_count: 5,
        on_hand: 0.0,
        movements_label: "pano-movements",
        position_label: "pano-position",
        description: "custom panel received and issued in matching small batches",
    },
    DemoProductContract {
        product_code: "KLIMA-12000BTU",
        expected_category: "SEASONAL",
        movement_count: 7,
        on_hand: 20.0,
        movements_label: "klima-movements",
        position_label: "klima-position",
        description: "air conditioner selling in early summer, with prior-year history",
    },
    DemoProductContract {
        product_code: "LED-PANEL-60X60",
        expected_category: "NEW_PRODUCT",
        movement_count: 3,
        on_hand: 37.0,
        movements_label: "led-movements",
        position_label: "led-position",
        description: "LED panel first received twenty days before the reference date",
    },
    DemoProductContract {
        product_code: "SIGORTA-C16",
        expected_category: "DEAD_STOCK",
        movement_count: 1,
        on_hand: 200.0,
        movements_label: "sigorta-movements",
        position_label: "sigorta-position",
        description: "fuse stock received last year and never issued",
    },
];

/// Deterministic demo inventory covering each demand category.
pub struct DemoInventoryDataset;

impl DemoInventoryDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_inventory.sql");

    /// Load the demo rows. Safe to call repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let products_seeded = DEMO_PRODUCTS
            .iter()
            .map(|product| ProductSeedInfo {
                product_code: product.product_code,
                expected_category: product.expected_category,
                description: product.description,
            })
            .collect::<Vec<_>>();

        info!(
            event_name = "db.fixtures.loaded",
            product_count = products_seeded.len(),
            reference_date = DEMO_REFERENCE_DATE,
            "demo inventory loaded"
        );

        Ok(SeedResult { products_seeded })
    }

    /// Check that every demo product has its movements and stock position.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for product in DEMO_PRODUCTS {
            let movement_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM stock_movement WHERE product_code = ?1")
                    .bind(product.product_code)
                    .fetch_one(pool)
                    .await?;
            checks.push((product.movements_label, movement_count == product.movement_count));

            let position_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM stock_position WHERE product_code = ?1 AND on_hand = ?2)",
            )
            .bind(product.product_code)
            .bind(product.on_hand)
            .fetch_one(pool)
            .await?;
            checks.push((product.position_label, position_ok == 1));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: Vec<ProductSeedInfo>,
}

#[derive(Debug)]
pub struct ProductSeedInfo {
    pub product_code: &'static str,
    pub expected_category: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoInventoryDataset::SQL.is_empty());
        for product in DEMO_PRODUCTS {
            assert!(
                DemoInventoryDataset::SQL.contains(product.product_code),
                "{} should appear in the fixture SQL",
                product.product_code
            );
        }
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoInventoryDataset::load(&pool).await.expect("load demo fixtures");
        let first_verification =
            DemoInventoryDataset::verify(&pool).await.expect("verify demo fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.products_seeded.len(), 6);

        let second = DemoInventoryDataset::load(&pool).await.expect("reload demo fixtures");
        let second_verification =
            DemoInventoryDataset::verify(&pool).await.expect("re-verify demo fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.products_seeded.len(), 6);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn verify_reports_missing_rows_before_load() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");

        let verification = DemoInventoryDataset::verify(&pool).await.expect("verify");

        assert!(!verification.all_present);
        assert_eq!(verification.checks.len(), DEMO_PRODUCTS.len() * 2);
    }

    #[tokio::test]
    async fn seeded_return_and_count_correction_are_stored_as_flags() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoInventoryDataset::load(&pool).await.expect("load demo fixtures");

        let returns: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM stock_movement WHERE product_code = ?1 AND is_return = 1",
        )
        .bind("KABLO-NYA-3X2.5")
        .fetch_one(&pool)
        .await
        .expect("count returns");
        let corrections: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM stock_movement WHERE document_kind = 'stock_count'",
        )
        .fetch_one(&pool)
        .await
        .expect("count corrections");

        assert_eq!(returns, 1);
        assert_eq!(corrections, 1);
    }
}
