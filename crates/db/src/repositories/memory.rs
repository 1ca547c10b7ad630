use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tokio::sync::RwLock;

use stoktakip_core::domain::movement::MovementRecord;
use stoktakip_core::domain::product::ProductCode;
use stoktakip_core::domain::stock::StockPosition;

use super::{MovementRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryMovementRepository {
    movements: RwLock<Vec<MovementRecord>>,
    positions: RwLock<BTreeMap<ProductCode, StockPosition>>,
}

impl InMemoryMovementRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MovementRepository for InMemoryMovementRepository {
    async fn list_product_codes(&self) -> Result<Vec<ProductCode>, RepositoryError> {
        let movements = self.movements.read().await;
        let positions = self.positions.read().await;

        let codes: BTreeSet<ProductCode> = movements
            .iter()
            .map(|movement| movement.product_code.clone())
            .chain(positions.keys().cloned())
            .collect();
        Ok(codes.into_iter().collect())
    }

    async fn find_movements(
        &self,
        product_code: &ProductCode,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<Vec<MovementRecord>, RepositoryError> {
        let movements = self.movements.read().await;

        let mut found: Vec<MovementRecord> = movements
            .iter()
            .filter(|movement| {
                movement.product_code == *product_code
                    && from.map_or(true, |from| movement.date >= from)
                    && movement.date <= to
            })
            .cloned()
            .collect();
        // Stable sort keeps insertion order within a day.
        found.sort_by_key(|movement| movement.date);
        Ok(found)
    }

    async fn find_stock_position(
        &self,
        product_code: &ProductCode,
    ) -> Result<Option<StockPosition>, RepositoryError> {
        let positions = self.positions.read().await;
        Ok(positions.get(product_code).cloned())
    }

    async fn record_movement(&self, movement: MovementRecord) -> Result<(), RepositoryError> {
        movement.validate()?;
        let mut movements = self.movements.write().await;
        movements.push(movement);
        Ok(())
    }

    async fn save_stock_position(&self, position: StockPosition) -> Result<(), RepositoryError> {
        position.validate()?;
        let mut positions = self.positions.write().await;
        positions.insert(position.product_code.clone(), position);
        Ok(())
    }
}
