//! Reduces raw movements into a [`ProductMovementSummary`].

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use super::types::ProductMovementSummary;
use crate::domain::movement::{AnalysisWindow, Direction, MovementRecord};
use crate::domain::product::ProductCode;

const QUANTITY_EPSILON: f64 = 1e-9;

/// Summarise the movements of `product_code` that fall inside `window`.
///
/// Records for other products or outside the window are ignored. Quantities
/// are expected to be validated already.
pub fn aggregate_movements(
    product_code: &ProductCode,
    records: &[MovementRecord],
    window: &AnalysisWindow,
) -> ProductMovementSummary {
    let mut summary = ProductMovementSummary::empty(product_code.clone());
    let mut active_days = BTreeSet::new();
    let mut sales_months = BTreeSet::new();
    let mut qualifying_quantities = Vec::new();
    let mut distribution = Vec::new();
    let mut gross_in = 0.0;
    let mut gross_out = 0.0;
    let mut returned_in = 0.0;
    let mut returned_out = 0.0;

    let in_scope = records
        .iter()
        .filter(|record| record.product_code == *product_code && window.contains(record.date));

    for record in in_scope {
        summary.total_movements += 1;
        active_days.insert(record.date);
        track_date_bounds(&mut summary, record.date);

        if record.document_kind.is_adjustment() {
            continue;
        }

        match (record.direction, record.is_return) {
            (Direction::In, false) => {
                summary.in_count += 1;
                gross_in += record.quantity;
            }
            (Direction::Out, false) => {
                summary.out_count += 1;
                gross_out += record.quantity;
                sales_months.insert((record.date.year(), record.date.month()));
                qualifying_quantities.push(record.quantity);
                if record.is_distribution_out() {
                    distribution.push(record.quantity);
                }
            }
            (Direction::In, true) => returned_in += record.quantity,
            (Direction::Out, true) => returned_out += record.quantity,
        }
    }

    summary.active_days = active_days.len() as u32;
    summary.total_in = (gross_in - returned_in).max(0.0);
    summary.total_out = (gross_out - returned_out).max(0.0);
    summary.months_with_sales = sales_months.len() as u32;
    summary.uniform_out_quantity = is_uniform(&qualifying_quantities);

    if !distribution.is_empty() {
        let min = distribution.iter().copied().fold(f64::INFINITY, f64::min);
        let max = distribution.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = distribution.iter().sum::<f64>() / distribution.len() as f64;
        summary.min_out_qty = Some(min);
        summary.max_out_qty = Some(max);
        summary.avg_out_qty = Some(avg);
    }

    summary
}

fn track_date_bounds(summary: &mut ProductMovementSummary, date: NaiveDate) {
    summary.first_movement_date = Some(summary.first_movement_date.map_or(date, |d| d.min(date)));
    summary.last_movement_date = Some(summary.last_movement_date.map_or(date, |d| d.max(date)));
}

fn is_uniform(quantities: &[f64]) -> bool {
    match quantities.split_first() {
        Some((first, rest)) => rest.iter().all(|q| (q - first).abs() <= QUANTITY_EPSILON),
        None => false,
    }
}
