//! Demand pattern classification.
//!
//! The category is chosen by an ordered rule list: the first rule whose
//! predicate holds wins, so reordering the list changes results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{DemandCategory, DemandClassification, ProductMovementSummary, StrategyHint};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Maximum number of receipts or issues for order-driven categories (default: 3)
    pub small_batch_limit: u32,
    /// Relative in/out imbalance tolerated for special orders (default: 0.10)
    pub balance_tolerance: f64,
    /// Activity span beyond which sparse sales are irregular (default: 30 days)
    pub irregular_min_active_days: u32,
    /// Age under which a product is treated as new (default: 60 days)
    pub new_product_days: i64,
    /// Idle time after which liquidation is suggested (default: 90 days)
    pub stale_after_days: i64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            small_batch_limit: 3,
            balance_tolerance: 0.10,
            irregular_min_active_days: 30,
            new_product_days: 60,
            stale_after_days: 90,
        }
    }
}

pub trait PatternClassifier: Send + Sync {
    fn classify(&self, summary: &ProductMovementSummary, now: NaiveDate) -> DemandClassification;
}

/// Inputs every rule predicate sees.
#[derive(Debug, Clone, Copy)]
struct Facts<'a> {
    summary: &'a ProductMovementSummary,
    days_since_first: Option<i64>,
    thresholds: &'a ClassifierThresholds,
}

type Rule = fn(&Facts<'_>) -> bool;

const RULES: &[(DemandCategory, Rule)] = &[
    (DemandCategory::DemandDriven, is_demand_driven),
    (DemandCategory::SpecialOrder, is_special_order),
    (DemandCategory::Irregular, is_irregular),
    (DemandCategory::NewProduct, is_new_product),
    (DemandCategory::Seasonal, is_seasonal),
    (DemandCategory::Regular, is_regular),
    (DemandCategory::DeadStock, is_dead_stock),
];

fn is_demand_driven(facts: &Facts<'_>) -> bool {
    let s = facts.summary;
    s.out_count <= facts.thresholds.small_batch_limit
        && s.has_outflow()
        && (s.uniform_out_quantity || s.out_count == 1)
        && s.months_with_sales <= 2
}

fn is_special_order(facts: &Facts<'_>) -> bool {
    let s = facts.summary;
    let limit = facts.thresholds.small_batch_limit;
    s.in_count <= limit
        && s.out_count <= limit
        && s.has_outflow()
        && (s.total_in - s.total_out).abs() < facts.thresholds.balance_tolerance * s.total_in
}

fn is_irregular(facts: &Facts<'_>) -> bool {
    let s = facts.summary;
    s.months_with_sales < 3
        && s.has_outflow()
        && s.active_days > facts.thresholds.irregular_min_active_days
}

// Checked after IRREGULAR on purpose: a young product that already looks
// sporadic stays IRREGULAR.
fn is_new_product(facts: &Facts<'_>) -> bool {
    facts.summary.has_outflow()
        && facts.days_since_first.is_some_and(|days| days <= facts.thresholds.new_product_days)
}

fn is_seasonal(facts: &Facts<'_>) -> bool {
    (2..=4).contains(&facts.summary.months_with_sales) && facts.summary.has_outflow()
}

fn is_regular(facts: &Facts<'_>) -> bool {
    facts.summary.months_with_sales >= 5 && facts.summary.has_outflow()
}

fn is_dead_stock(facts: &Facts<'_>) -> bool {
    !facts.summary.has_outflow()
}

#[derive(Debug, Clone, Default)]
pub struct DeterministicPatternClassifier {
    thresholds: ClassifierThresholds,
}

impl DeterministicPatternClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    fn category(&self, summary: &ProductMovementSummary, now: NaiveDate) -> DemandCategory {
        let facts = Facts {
            summary,
            days_since_first: summary.first_movement_date.map(|first| (now - first).num_days()),
            thresholds: &self.thresholds,
        };

        RULES
            .iter()
            .find(|(_, rule)| rule(&facts))
            .map(|(category, _)| *category)
            .unwrap_or(DemandCategory::Undetermined)
    }

    fn strategy_hint(
        &self,
        category: DemandCategory,
        summary: &ProductMovementSummary,
        now: NaiveDate,
    ) -> StrategyHint {
        if category == DemandCategory::DemandDriven {
            return StrategyHint::SupplyOnDemand;
        }

        let stale = summary
            .last_movement_date
            .is_some_and(|last| (now - last).num_days() > self.thresholds.stale_after_days);
        if !summary.has_outflow() || stale {
            StrategyHint::Liquidate
        } else {
            StrategyHint::Standard
        }
    }
}

impl PatternClassifier for DeterministicPatternClassifier {
    fn classify(&self, summary: &ProductMovementSummary, now: NaiveDate) -> DemandClassification {
        let category = self.category(summary, now);
        let normalized_monthly_demand = normalized_monthly_demand(category, summary);
        let strategy_hint = self.strategy_hint(category, summary, now);

        DemandClassification { category, normalized_monthly_demand, strategy_hint }
    }
}

/// Net outflow per month that actually had sales.
pub fn normalized_monthly_demand(
    category: DemandCategory,
    summary: &ProductMovementSummary,
) -> Option<f64> {
    if category.is_order_driven() {
        return None;
    }
    if summary.months_with_sales > 0 {
        Some(summary.total_out / f64::from(summary.months_with_sales))
    } else {
        Some(0.0)
    }
}
