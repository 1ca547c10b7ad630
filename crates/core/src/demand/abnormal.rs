//! Abnormal sale detection over the open-market issue set.

use super::types::{AbnormalSale, ProductMovementSummary};
use crate::domain::movement::{AnalysisWindow, MovementRecord};

/// Minimum issues before an average is trusted.
const MIN_SAMPLES: usize = 3;

/// Flags issues whose quantity is far above the product's average issue.
///
/// Uses the same movement set as the summary's min/max/avg so both views
/// agree on what a normal sale looks like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbnormalSaleDetector {
    multiplier: f64,
}

impl Default for AbnormalSaleDetector {
    fn default() -> Self {
        Self { multiplier: 3.0 }
    }
}

impl AbnormalSaleDetector {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    pub fn detect(
        &self,
        records: &[MovementRecord],
        summary: &ProductMovementSummary,
        window: &AnalysisWindow,
    ) -> Vec<AbnormalSale> {
        let Some(average) = summary.avg_out_qty.filter(|avg| *avg > 0.0) else {
            return Vec::new();
        };

        let issues: Vec<&MovementRecord> = records
            .iter()
            .filter(|record| {
                record.product_code == summary.product_code
                    && window.contains(record.date)
                    && record.is_distribution_out()
            })
            .collect();

        if issues.len() < MIN_SAMPLES {
            return Vec::new();
        }

        let limit = average * self.multiplier;
        issues
            .into_iter()
            .filter(|record| record.quantity > limit)
            .map(|record| {
                let ratio = record.quantity / average;
                AbnormalSale {
                    date: record.date,
                    quantity: record.quantity,
                    average_quantity: average,
                    ratio,
                    explanation: format!(
                        "Issue of {:.2} on {} is {ratio:.1}x the average issue of {average:.2} for {}",
                        record.quantity, record.date, summary.product_code
                    ),
                }
            })
            .collect()
    }
}
