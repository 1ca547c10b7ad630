//! Plain data records produced by the demand pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductCode;

/// Per-product reduction of the movements inside one analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMovementSummary {
    pub product_code: ProductCode,
    pub total_movements: u32,
    pub in_count: u32,
    pub out_count: u32,
    /// Distinct dates with any movement, adjustments included.
    pub active_days: u32,
    /// Receipts net of purchase returns, never below zero.
    pub total_in: f64,
    /// Issues net of sales returns, never below zero.
    pub total_out: f64,
    pub min_out_qty: Option<f64>,
    pub max_out_qty: Option<f64>,
    pub avg_out_qty: Option<f64>,
    /// Every qualifying issue moved the same quantity.
    pub uniform_out_quantity: bool,
    pub first_movement_date: Option<NaiveDate>,
    pub last_movement_date: Option<NaiveDate>,
    pub months_with_sales: u32,
}

impl ProductMovementSummary {
    pub fn empty(product_code: ProductCode) -> Self {
        Self {
            product_code,
            total_movements: 0,
            in_count: 0,
            out_count: 0,
            active_days: 0,
            total_in: 0.0,
            total_out: 0.0,
            min_out_qty: None,
            max_out_qty: None,
            avg_out_qty: None,
            uniform_out_quantity: false,
            first_movement_date: None,
            last_movement_date: None,
            months_with_sales: 0,
        }
    }

    pub fn has_outflow(&self) -> bool {
        self.total_out > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandCategory {
    /// A handful of identical or single withdrawals.
    DemandDriven,
    /// Balanced, infrequent pass-through batches.
    SpecialOrder,
    Irregular,
    NewProduct,
    Seasonal,
    Regular,
    DeadStock,
    Undetermined,
}

impl DemandCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DemandDriven => "DEMAND_DRIVEN",
            Self::SpecialOrder => "SPECIAL_ORDER",
            Self::Irregular => "IRREGULAR",
            Self::NewProduct => "NEW_PRODUCT",
            Self::Seasonal => "SEASONAL",
            Self::Regular => "REGULAR",
            Self::DeadStock => "DEAD_STOCK",
            Self::Undetermined => "UNDETERMINED",
        }
    }

    /// Categories that are only ever supplied against a confirmed order.
    pub fn is_order_driven(&self) -> bool {
        matches!(self, Self::DemandDriven | Self::SpecialOrder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyHint {
    SupplyOnDemand,
    Liquidate,
    Standard,
}

impl StrategyHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupplyOnDemand => "supply-on-demand",
            Self::Liquidate => "liquidate",
            Self::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandClassification {
    pub category: DemandCategory,
    /// `None` where a monthly average means nothing (order-driven categories).
    pub normalized_monthly_demand: Option<f64>,
    pub strategy_hint: StrategyHint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonalPatternType {
    Stable,
    Seasonal,
    Trending,
    Irregular,
}

/// Net issued quantity per calendar month, January first.
pub type MonthlyTotals = [f64; 12];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalProfile {
    pub pattern_type: SeasonalPatternType,
    /// 1.0 is an average month.
    pub monthly_index: [f64; 12],
    pub std_deviation: f64,
    /// 1 = January.
    pub peak_month: u32,
    pub trough_month: u32,
    /// Share of annual volume held by the two strongest months.
    pub concentration_ratio: f64,
    /// 0-100.
    pub risk_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplenishmentReason {
    NoProactiveReplenishment,
    StockOut,
    BelowMonthlyDemand,
    SeasonalBuffer,
    SufficientOrNotApplicable,
}

impl ReplenishmentReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoProactiveReplenishment => "no-proactive-replenishment",
            Self::StockOut => "stock-out",
            Self::BelowMonthlyDemand => "below-monthly-demand",
            Self::SeasonalBuffer => "seasonal-buffer",
            Self::SufficientOrNotApplicable => "sufficient-or-not-applicable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentSuggestion {
    pub recommended_quantity: f64,
    pub target_months: f64,
    pub reason: ReplenishmentReason,
    pub justification: String,
    /// Months of normalized demand the current stock covers.
    pub coverage_months: Option<f64>,
    /// Echoed for display; never subtracted from the recommendation.
    pub open_order_quantity: f64,
}

/// An open-market issue far above the product's typical issue size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbnormalSale {
    pub date: NaiveDate,
    pub quantity: f64,
    pub average_quantity: f64,
    pub ratio: f64,
    pub explanation: String,
}

/// Everything the pipeline produces for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAnalysis {
    pub product_code: ProductCode,
    pub reference_date: NaiveDate,
    pub summary: ProductMovementSummary,
    pub classification: DemandClassification,
    pub seasonality: SeasonalProfile,
    pub suggestion: ReplenishmentSuggestion,
    pub abnormal_sales: Vec<AbnormalSale>,
}
