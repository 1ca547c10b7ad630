use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductCode;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(format!("unknown movement direction `{other}` (expected in|out)")),
        }
    }
}

/// Document type a movement was booked under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Sale, purchase receipt, or project issue.
    Ordinary,
    /// Stock count correction.
    StockCount,
    /// Product swap with a customer or supplier.
    Exchange,
}

impl DocumentKind {
    /// Adjustments move stock without reflecting demand or supply.
    pub fn is_adjustment(&self) -> bool {
        matches!(self, Self::StockCount | Self::Exchange)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordinary => "ordinary",
            Self::StockCount => "stock_count",
            Self::Exchange => "exchange",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ordinary" => Ok(Self::Ordinary),
            "stock_count" => Ok(Self::StockCount),
            "exchange" => Ok(Self::Exchange),
            other => Err(format!(
                "unknown document kind `{other}` (expected ordinary|stock_count|exchange)"
            )),
        }
    }
}

/// One inventory transaction.
///
/// For returns, `direction` names the side being reversed: an `Out` return
/// gives goods back against an earlier issue and reduces net outflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub product_code: ProductCode,
    pub date: NaiveDate,
    pub direction: Direction,
    pub quantity: f64,
    pub is_return: bool,
    pub is_project_consumption: bool,
    pub document_kind: DocumentKind,
}

impl MovementRecord {
    pub fn new(
        product_code: impl Into<ProductCode>,
        date: NaiveDate,
        direction: Direction,
        quantity: f64,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            date,
            direction,
            quantity,
            is_return: false,
            is_project_consumption: false,
            document_kind: DocumentKind::Ordinary,
        }
    }

    pub fn returned(mut self) -> Self {
        self.is_return = true;
        self
    }

    pub fn for_project(mut self) -> Self {
        self.is_project_consumption = true;
        self
    }

    pub fn with_document_kind(mut self, kind: DocumentKind) -> Self {
        self.document_kind = kind;
        self
    }

    /// Non-return, non-adjustment issue. Counts as a sale for month activity.
    pub fn is_qualifying_out(&self) -> bool {
        self.direction == Direction::Out && !self.is_return && !self.document_kind.is_adjustment()
    }

    /// Qualifying issue that is also open-market demand. This is the set the
    /// distribution stats and abnormal-sale detection are computed over.
    pub fn is_distribution_out(&self) -> bool {
        self.is_qualifying_out() && !self.is_project_consumption
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.quantity.is_finite() {
            return Err(DomainError::NonFiniteQuantity {
                product_code: self.product_code.0.clone(),
                date: self.date,
                quantity: self.quantity,
            });
        }
        if self.quantity < 0.0 {
            return Err(DomainError::NegativeQuantity {
                product_code: self.product_code.0.clone(),
                date: self.date,
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

/// Inclusive date range the aggregator and classifier look at.
///
/// Deserialization goes through [`AnalysisWindow::new`], so an inverted
/// range is rejected at the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct AnalysisWindow {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct WindowBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<WindowBounds> for AnalysisWindow {
    type Error = DomainError;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl AnalysisWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering the `months` calendar months that end on `end`.
    pub fn trailing_months(end: NaiveDate, months: u32) -> Result<Self, DomainError> {
        let start = end
            .checked_sub_months(chrono::Months::new(months))
            .and_then(|date| date.succ_opt())
            .unwrap_or(NaiveDate::MIN);
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Re-checks the ordering invariant on a window built elsewhere.
    pub fn validate(&self) -> Result<(), DomainError> {
        Self::new(self.start, self.end).map(|_| ())
    }
}

pub fn validate_movements(records: &[MovementRecord]) -> Result<(), DomainError> {
    records.iter().try_for_each(MovementRecord::validate)
}
