//! Replenishment decision table.

use super::types::{
    DemandCategory, DemandClassification, ReplenishmentReason, ReplenishmentSuggestion,
    SeasonalProfile,
};

/// Coverage horizon for regular products, in months.
const REGULAR_TARGET_MONTHS: f64 = 2.0;
/// Wider buffer ahead of a concentrated selling window.
const SEASONAL_TARGET_MONTHS: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct AdvisorInput<'a> {
    pub classification: &'a DemandClassification,
    pub seasonality: Option<&'a SeasonalProfile>,
    pub on_hand: f64,
    /// Informative only; reconciliation with open orders happens downstream.
    pub on_order: f64,
}

pub trait ReplenishmentAdvisor: Send + Sync {
    fn advise(&self, input: &AdvisorInput<'_>) -> ReplenishmentSuggestion;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicReplenishmentAdvisor;

impl ReplenishmentAdvisor for DeterministicReplenishmentAdvisor {
    fn advise(&self, input: &AdvisorInput<'_>) -> ReplenishmentSuggestion {
        let category = input.classification.category;
        let demand = input.classification.normalized_monthly_demand.unwrap_or(0.0);
        let on_hand = input.on_hand;

        let (quantity, target_months, reason) = if category.is_order_driven() {
            (0.0, 0.0, ReplenishmentReason::NoProactiveReplenishment)
        } else if on_hand <= 0.0 && demand > 0.0 && category == DemandCategory::Regular {
            (demand * REGULAR_TARGET_MONTHS, REGULAR_TARGET_MONTHS, ReplenishmentReason::StockOut)
        } else if on_hand < demand && category == DemandCategory::Regular {
            (
                demand * REGULAR_TARGET_MONTHS - on_hand,
                REGULAR_TARGET_MONTHS,
                ReplenishmentReason::BelowMonthlyDemand,
            )
        } else if category == DemandCategory::Seasonal && on_hand < demand {
            (
                demand * SEASONAL_TARGET_MONTHS,
                SEASONAL_TARGET_MONTHS,
                ReplenishmentReason::SeasonalBuffer,
            )
        } else {
            (0.0, 0.0, ReplenishmentReason::SufficientOrNotApplicable)
        };

        let recommended_quantity = quantity.max(0.0);
        let coverage_months = (demand > 0.0).then(|| on_hand / demand);

        ReplenishmentSuggestion {
            recommended_quantity,
            target_months,
            reason,
            justification: justification(input, reason, demand, recommended_quantity),
            coverage_months,
            open_order_quantity: input.on_order,
        }
    }
}

fn justification(
    input: &AdvisorInput<'_>,
    reason: ReplenishmentReason,
    demand: f64,
    quantity: f64,
) -> String {
    let category = input.classification.category.as_str();
    match reason {
        ReplenishmentReason::NoProactiveReplenishment => {
            format!("{category}: supplied against confirmed orders only, no stock is held ahead")
        }
        ReplenishmentReason::StockOut => format!(
            "{category}: out of stock ({:.2} on hand) with {demand:.2}/month demand, order {quantity:.2} for {REGULAR_TARGET_MONTHS} months",
            input.on_hand
        ),
        ReplenishmentReason::BelowMonthlyDemand => format!(
            "{category}: {:.2} on hand is below {demand:.2}/month demand, top up to {REGULAR_TARGET_MONTHS} months with {quantity:.2}",
            input.on_hand
        ),
        ReplenishmentReason::SeasonalBuffer => {
            let peak = input
                .seasonality
                .map(|profile| format!(", peak month {}", profile.peak_month))
                .unwrap_or_default();
            format!(
                "{category}: {:.2} on hand is below {demand:.2}/month demand{peak}, buffer {quantity:.2} for {SEASONAL_TARGET_MONTHS} months",
                input.on_hand
            )
        }
        ReplenishmentReason::SufficientOrNotApplicable => format!(
            "{category}: no order needed ({:.2} on hand, {demand:.2}/month demand)",
            input.on_hand
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::types::{SeasonalPatternType, StrategyHint};

    fn classification(category: DemandCategory, demand: Option<f64>) -> DemandClassification {
        DemandClassification {
            category,
            normalized_monthly_demand: demand,
            strategy_hint: StrategyHint::Standard,
        }
    }

    fn advise(c: &DemandClassification, on_hand: f64) -> ReplenishmentSuggestion {
        DeterministicReplenishmentAdvisor.advise(&AdvisorInput {
            classification: c,
            seasonality: None,
            on_hand,
            on_order: 0.0,
        })
    }

    #[test]
    fn order_driven_categories_are_never_replenished() {
        for category in [DemandCategory::DemandDriven, DemandCategory::SpecialOrder] {
            let suggestion = advise(&classification(category, None), -10.0);

            assert_eq!(suggestion.recommended_quantity, 0.0);
            assert_eq!(suggestion.reason, ReplenishmentReason::NoProactiveReplenishment);
            assert_eq!(suggestion.reason.code(), "no-proactive-replenishment");
        }
    }

    #[test]
    fn regular_stock_out_orders_two_months() {
        let suggestion = advise(&classification(DemandCategory::Regular, Some(200.0)), 0.0);

        assert_eq!(suggestion.recommended_quantity, 400.0);
        assert_eq!(suggestion.target_months, 2.0);
        assert_eq!(suggestion.reason, ReplenishmentReason::StockOut);
    }

    #[test]
    fn negative_stock_does_not_inflate_stock_out_order() {
        let suggestion = advise(&classification(DemandCategory::Regular, Some(200.0)), -30.0);

        assert_eq!(suggestion.recommended_quantity, 400.0);
    }

    #[test]
    fn regular_below_demand_tops_up_to_two_months() {
        let suggestion = advise(&classification(DemandCategory::Regular, Some(200.0)), 50.0);

        assert_eq!(suggestion.recommended_quantity, 350.0);
        assert_eq!(suggestion.target_months, 2.0);
        assert_eq!(suggestion.reason, ReplenishmentReason::BelowMonthlyDemand);
        assert_eq!(suggestion.coverage_months, Some(0.25));
    }

    #[test]
    fn seasonal_below_demand_buffers_three_months() {
        let profile = SeasonalProfile {
            pattern_type: SeasonalPatternType::Seasonal,
            monthly_index: [1.0; 12],
            std_deviation: 0.8,
            peak_month: 7,
            trough_month: 1,
            concentration_ratio: 0.5,
            risk_score: 60.0,
        };
        let c = classification(DemandCategory::Seasonal, Some(40.0));

        let suggestion = DeterministicReplenishmentAdvisor.advise(&AdvisorInput {
            classification: &c,
            seasonality: Some(&profile),
            on_hand: 10.0,
            on_order: 25.0,
        });

        assert_eq!(suggestion.recommended_quantity, 120.0);
        assert_eq!(suggestion.target_months, 3.0);
        assert_eq!(suggestion.reason, ReplenishmentReason::SeasonalBuffer);
        assert_eq!(suggestion.open_order_quantity, 25.0);
        assert!(suggestion.justification.contains("peak month 7"));
    }

    #[test]
    fn sufficient_stock_needs_no_order() {
        let suggestion = advise(&classification(DemandCategory::Regular, Some(200.0)), 500.0);

        assert_eq!(suggestion.recommended_quantity, 0.0);
        assert_eq!(suggestion.reason, ReplenishmentReason::SufficientOrNotApplicable);
        assert_eq!(suggestion.coverage_months, Some(2.5));
    }

    #[test]
    fn other_categories_fall_through() {
        for category in [
            DemandCategory::Irregular,
            DemandCategory::NewProduct,
            DemandCategory::DeadStock,
            DemandCategory::Undetermined,
        ] {
            let suggestion = advise(&classification(category, Some(20.0)), 0.0);

            assert_eq!(suggestion.recommended_quantity, 0.0);
            assert_eq!(suggestion.reason, ReplenishmentReason::SufficientOrNotApplicable);
        }
    }
}
