use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use stoktakip_core::domain::movement::MovementRecord;
use stoktakip_core::domain::product::ProductCode;
use stoktakip_core::domain::stock::StockPosition;
use stoktakip_core::errors::{ApplicationError, DomainError};

pub mod memory;
pub mod movement;

pub use memory::InMemoryMovementRepository;
pub use movement::SqlMovementRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("rejected record: {0}")]
    Invalid(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Invalid(domain) => Self::Domain(domain),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Supplies raw movement rows and stock levels to the demand engine.
#[async_trait]
pub trait MovementRepository: Send + Sync {
    /// Every product that has movements or a stock position, sorted.
    async fn list_product_codes(&self) -> Result<Vec<ProductCode>, RepositoryError>;

    /// Movements dated `from..=to`, oldest first. `None` reads from the
    /// beginning of history.
    async fn find_movements(
        &self,
        product_code: &ProductCode,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<Vec<MovementRecord>, RepositoryError>;

    async fn find_stock_position(
        &self,
        product_code: &ProductCode,
    ) -> Result<Option<StockPosition>, RepositoryError>;

    async fn record_movement(&self, movement: MovementRecord) -> Result<(), RepositoryError>;

    async fn save_stock_position(&self, position: StockPosition) -> Result<(), RepositoryError>;
}
