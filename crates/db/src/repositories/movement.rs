use chrono::NaiveDate;
use sqlx::Row;

use stoktakip_core::domain::movement::{Direction, DocumentKind, MovementRecord};
use stoktakip_core::domain::product::ProductCode;
use stoktakip_core::domain::stock::StockPosition;

use super::{MovementRepository, RepositoryError};
use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlMovementRepository {
    pool: DbPool,
}

impl SqlMovementRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_movement(row: &sqlx::sqlite::SqliteRow) -> Result<MovementRecord, RepositoryError> {
    let product_code: String = decode(row, "product_code")?;
    let date_str: String = decode(row, "movement_date")?;
    let direction_str: String = decode(row, "direction")?;
    let quantity: f64 = decode(row, "quantity")?;
    let is_return: bool = decode(row, "is_return")?;
    let is_project_consumption: bool = decode(row, "is_project_consumption")?;
    let document_kind_str: String = decode(row, "document_kind")?;

    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
        RepositoryError::Decode(format!("movement_date `{date_str}` for {product_code}: {e}"))
    })?;
    let direction = direction_str.parse::<Direction>().map_err(RepositoryError::Decode)?;
    let document_kind =
        document_kind_str.parse::<DocumentKind>().map_err(RepositoryError::Decode)?;

    Ok(MovementRecord {
        product_code: ProductCode(product_code),
        date,
        direction,
        quantity,
        is_return,
        is_project_consumption,
        document_kind,
    })
}

#[async_trait::async_trait]
impl MovementRepository for SqlMovementRepository {
    async fn list_product_codes(&self) -> Result<Vec<ProductCode>, RepositoryError> {
        let codes: Vec<String> = sqlx::query_scalar(
            "SELECT product_code FROM stock_movement
             UNION
             SELECT product_code FROM stock_position
             ORDER BY product_code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(codes.into_iter().map(ProductCode).collect())
    }

    async fn find_movements(
        &self,
        product_code: &ProductCode,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<Vec<MovementRecord>, RepositoryError> {
        // ISO dates compare correctly as text.
        let from_str = from.map(|date| date.format(DATE_FORMAT).to_string());
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT product_code, movement_date, direction, quantity, is_return,
                    is_project_consumption, document_kind
             FROM stock_movement
             WHERE product_code = ?
               AND (? IS NULL OR movement_date >= ?)
               AND movement_date <= ?
             ORDER BY movement_date ASC, id ASC",
        )
        .bind(product_code.as_str())
        .bind(&from_str)
        .bind(&from_str)
        .bind(to.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_movement).collect::<Result<Vec<_>, _>>()
    }

    async fn find_stock_position(
        &self,
        product_code: &ProductCode,
    ) -> Result<Option<StockPosition>, RepositoryError> {
        let row = sqlx::query(
            "SELECT product_code, on_hand, on_order FROM stock_position WHERE product_code = ?",
        )
        .bind(product_code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(StockPosition {
                product_code: ProductCode(decode(r, "product_code")?),
                on_hand: decode(r, "on_hand")?,
                on_order: decode(r, "on_order")?,
            })),
            None => Ok(None),
        }
    }

    async fn record_movement(&self, movement: MovementRecord) -> Result<(), RepositoryError> {
        movement.validate()?;

        sqlx::query(
            "INSERT INTO stock_movement (product_code, movement_date, direction, quantity,
                                         is_return, is_project_consumption, document_kind)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(movement.product_code.as_str())
        .bind(movement.date.format(DATE_FORMAT).to_string())
        .bind(movement.direction.as_str())
        .bind(movement.quantity)
        .bind(movement.is_return)
        .bind(movement.is_project_consumption)
        .bind(movement.document_kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_stock_position(&self, position: StockPosition) -> Result<(), RepositoryError> {
        position.validate()?;

        sqlx::query(
            "INSERT INTO stock_position (product_code, on_hand, on_order)
             VALUES (?, ?, ?)
             ON CONFLICT(product_code) DO UPDATE SET
                 on_hand = excluded.on_hand,
                 on_order = excluded.on_order",
        )
        .bind(position.product_code.as_str())
        .bind(position.on_hand)
        .bind(position.on_order)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
