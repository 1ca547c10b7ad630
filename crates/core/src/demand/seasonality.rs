//! Seasonal concentration of demand across the calendar year.
//!
//! Movements are bucketed by month number regardless of year, so several
//! years of history fold into one 12-bucket profile.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::types::{MonthlyTotals, SeasonalPatternType, SeasonalProfile};
use crate::domain::movement::{Direction, MovementRecord};
use crate::domain::product::ProductCode;

/// Share of annual volume the top two months would hold if demand were flat.
const FLAT_TOP_TWO_SHARE: f64 = 2.0 / 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityThresholds {
    /// Index std-dev below which demand is stable (default: 0.3)
    pub stable_std_dev: f64,
    /// Top-two-month share above which dispersed demand is seasonal (default: 0.40)
    pub seasonal_concentration: f64,
    /// Consecutive monotonic months needed to call a trend (default: 8)
    pub trend_run_months: usize,
}

impl Default for SeasonalityThresholds {
    fn default() -> Self {
        Self { stable_std_dev: 0.3, seasonal_concentration: 0.40, trend_run_months: 8 }
    }
}

pub trait SeasonalityAnalyzer: Send + Sync {
    fn analyze(&self, monthly_totals: &MonthlyTotals) -> SeasonalProfile;
}

/// Net issued quantity per calendar month for `product_code`.
///
/// Sales returns are netted within their month; a month never goes negative.
pub fn monthly_out_totals(
    product_code: &ProductCode,
    records: &[MovementRecord],
) -> MonthlyTotals {
    let mut totals = [0.0; 12];

    let issues = records.iter().filter(|record| {
        record.product_code == *product_code
            && record.direction == Direction::Out
            && !record.document_kind.is_adjustment()
    });

    for record in issues {
        let bucket = record.date.month0() as usize;
        if record.is_return {
            totals[bucket] -= record.quantity;
        } else {
            totals[bucket] += record.quantity;
        }
    }

    totals.iter_mut().for_each(|total| *total = total.max(0.0));
    totals
}

#[derive(Debug, Clone, Default)]
pub struct DeterministicSeasonalityAnalyzer {
    thresholds: SeasonalityThresholds,
}

impl DeterministicSeasonalityAnalyzer {
    pub fn new(thresholds: SeasonalityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &SeasonalityThresholds {
        &self.thresholds
    }

    fn pattern_type(
        &self,
        totals: &MonthlyTotals,
        std_deviation: f64,
        concentration: f64,
    ) -> SeasonalPatternType {
        if std_deviation < self.thresholds.stable_std_dev {
            SeasonalPatternType::Stable
        } else if concentration > self.thresholds.seasonal_concentration {
            SeasonalPatternType::Seasonal
        } else if longest_monotonic_run(totals) >= self.thresholds.trend_run_months {
            SeasonalPatternType::Trending
        } else {
            SeasonalPatternType::Irregular
        }
    }
}

impl SeasonalityAnalyzer for DeterministicSeasonalityAnalyzer {
    fn analyze(&self, monthly_totals: &MonthlyTotals) -> SeasonalProfile {
        let monthly_totals = &summable(monthly_totals);
        let annual: f64 = monthly_totals.iter().sum();
        let mean = annual / 12.0;

        if mean <= f64::EPSILON {
            return SeasonalProfile {
                pattern_type: SeasonalPatternType::Stable,
                monthly_index: [0.0; 12],
                std_deviation: 0.0,
                peak_month: 1,
                trough_month: 1,
                concentration_ratio: 0.0,
                risk_score: 0.0,
            };
        }

        let monthly_index = monthly_totals.map(|total| total / mean);
        let std_deviation = population_std_dev(&monthly_index);
        let concentration_ratio = top_two_share(monthly_totals, annual);
        let pattern_type = self.pattern_type(monthly_totals, std_deviation, concentration_ratio);

        SeasonalProfile {
            pattern_type,
            monthly_index,
            std_deviation,
            peak_month: arg_extreme(&monthly_index, |candidate, best| candidate > best),
            trough_month: arg_extreme(&monthly_index, |candidate, best| candidate < best),
            concentration_ratio,
            risk_score: risk_score(std_deviation, concentration_ratio),
        }
    }
}

/// Seasonal-timing risk in [0, 100].
///
/// Dispersion contributes 60 points through `s / (s + 1)`; concentration
/// above the flat-year share contributes the remaining 40. Both terms are
/// non-decreasing in their input.
/// NaN inputs contribute nothing and an infinite spread saturates its term.
pub fn risk_score(std_deviation: f64, concentration_ratio: f64) -> f64 {
    let s = std_deviation.max(0.0);
    let dispersion = if s.is_finite() { s / (s + 1.0) } else { 1.0 };
    let concentration = if concentration_ratio.is_nan() {
        0.0
    } else {
        ((concentration_ratio - FLAT_TOP_TWO_SHARE) / (1.0 - FLAT_TOP_TWO_SHARE)).clamp(0.0, 1.0)
    };

    (100.0 * (0.6 * dispersion + 0.4 * concentration)).clamp(0.0, 100.0)
}

/// Totals whose sum overflows are divided by the busiest month. Every
/// statistic here is a ratio, so a common factor leaves the profile unchanged.
/// A non-finite month cannot be profiled and reads as no demand.
fn summable(totals: &MonthlyTotals) -> MonthlyTotals {
    if totals.iter().any(|total| !total.is_finite()) {
        return [0.0; 12];
    }
    if totals.iter().sum::<f64>().is_finite() {
        return *totals;
    }
    let busiest = totals.iter().copied().fold(0.0, f64::max);
    totals.map(|total| total / busiest)
}

fn population_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

fn top_two_share(totals: &MonthlyTotals, annual: f64) -> f64 {
    let mut sorted = *totals;
    sorted.sort_by(|a, b| b.total_cmp(a));
    (sorted[0] + sorted[1]) / annual
}

/// 1-based month of the first value that beats every other under `better`.
fn arg_extreme(values: &[f64; 12], better: impl Fn(f64, f64) -> bool) -> u32 {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate().skip(1) {
        if better(*value, values[best]) {
            best = idx;
        }
    }
    best as u32 + 1
}

/// Length in months of the longest strictly rising or strictly falling run.
fn longest_monotonic_run(totals: &MonthlyTotals) -> usize {
    let mut longest = 1;
    let mut rising = 1;
    let mut falling = 1;

    for pair in totals.windows(2) {
        rising = if pair[1] > pair[0] { rising + 1 } else { 1 };
        falling = if pair[1] < pair[0] { falling + 1 } else { 1 };
        longest = longest.max(rising).max(falling);
    }

    longest
}
