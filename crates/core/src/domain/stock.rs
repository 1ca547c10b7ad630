use serde::{Deserialize, Serialize};

use crate::domain::product::ProductCode;
use crate::errors::DomainError;

/// Current stock level for a product as reported by the warehouse system.
///
/// `on_hand` may be negative when issues were booked ahead of receipts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockPosition {
    pub product_code: ProductCode,
    pub on_hand: f64,
    pub on_order: f64,
}

impl StockPosition {
    pub fn empty(product_code: ProductCode) -> Self {
        Self { product_code, on_hand: 0.0, on_order: 0.0 }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let reason = if !self.on_hand.is_finite() || !self.on_order.is_finite() {
            "on_hand and on_order must be finite"
        } else if self.on_order < 0.0 {
            "on_order must not be negative"
        } else {
            return Ok(());
        };
        Err(DomainError::InvalidStockPosition {
            product_code: self.product_code.0.clone(),
            reason: reason.to_owned(),
        })
    }
}
