//! Parallel analysis of many products.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{DemandCategory, ProductAnalysis};
use super::{DemandRuntime, ProductAnalysisInput};
use crate::domain::product::ProductCode;
use crate::errors::ApplicationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProductOutcome {
    Analyzed(Box<ProductAnalysis>),
    Failed { product_code: ProductCode, error: String },
}

impl ProductOutcome {
    pub fn product_code(&self) -> &ProductCode {
        match self {
            Self::Analyzed(analysis) => &analysis.product_code,
            Self::Failed { product_code, .. } => product_code,
        }
    }

    pub fn analysis(&self) -> Option<&ProductAnalysis> {
        match self {
            Self::Analyzed(analysis) => Some(analysis.as_ref()),
            Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub reference_date: Option<NaiveDate>,
    /// Same order as the inputs.
    pub outcomes: Vec<ProductOutcome>,
    pub category_counts: BTreeMap<DemandCategory, usize>,
    pub total_recommended_quantity: f64,
    pub failed: usize,
}

impl BatchReport {
    fn from_outcomes(
        run_id: String,
        reference_date: Option<NaiveDate>,
        outcomes: Vec<ProductOutcome>,
    ) -> Self {
        let mut category_counts = BTreeMap::new();
        let mut total_recommended_quantity = 0.0;
        let mut failed = 0;

        for outcome in &outcomes {
            match outcome.analysis() {
                Some(analysis) => {
                    *category_counts.entry(analysis.classification.category).or_insert(0) += 1;
                    total_recommended_quantity += analysis.suggestion.recommended_quantity;
                }
                None => failed += 1,
            }
        }

        Self {
            run_id,
            reference_date,
            outcomes,
            category_counts,
            total_recommended_quantity,
            failed,
        }
    }

    pub fn analyzed(&self) -> usize {
        self.outcomes.len() - self.failed
    }
}

/// Runs a [`DemandRuntime`] over a batch on a bounded rayon pool.
pub struct BatchAnalyzer<R> {
    runtime: R,
    parallelism: usize,
}

impl<R: DemandRuntime> BatchAnalyzer<R> {
    /// `parallelism == 0` uses every available core.
    pub fn new(runtime: R, parallelism: usize) -> Self {
        Self { runtime, parallelism }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn run(&self, inputs: &[ProductAnalysisInput]) -> Result<BatchReport, ApplicationError> {
        let run_id = Uuid::new_v4().to_string();
        let reference_date = inputs.first().map(|input| input.now);

        info!(
            event_name = "analysis.batch.started",
            correlation_id = %run_id,
            product_count = inputs.len(),
            parallelism = self.parallelism,
            "demand analysis batch started"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
            .map_err(|error| ApplicationError::Runtime(error.to_string()))?;

        let outcomes: Vec<ProductOutcome> = pool.install(|| {
            inputs.par_iter().map(|input| self.analyze_one(input, &run_id)).collect()
        });

        let report = BatchReport::from_outcomes(run_id, reference_date, outcomes);

        info!(
            event_name = "analysis.batch.completed",
            correlation_id = %report.run_id,
            analyzed = report.analyzed(),
            failed = report.failed,
            total_recommended_quantity = report.total_recommended_quantity,
            "demand analysis batch completed"
        );

        Ok(report)
    }

    fn analyze_one(&self, input: &ProductAnalysisInput, run_id: &str) -> ProductOutcome {
        match self.runtime.analyze_product(input) {
            Ok(analysis) => {
                debug!(
                    event_name = "analysis.product.completed",
                    correlation_id = run_id,
                    product_code = %analysis.product_code,
                    category = analysis.classification.category.as_str(),
                    recommended_quantity = analysis.suggestion.recommended_quantity,
                    "product analysed"
                );
                ProductOutcome::Analyzed(Box::new(analysis))
            }
            Err(error) => {
                let failure = ApplicationError::from(error).into_interface(run_id);
                warn!(
                    event_name = "analysis.product.rejected",
                    correlation_id = failure.correlation_id(),
                    product_code = %input.product_code,
                    error = %failure,
                    "product input rejected"
                );
                ProductOutcome::Failed {
                    product_code: input.product_code.clone(),
                    error: failure.to_string(),
                }
            }
        }
    }
}
