//! Stock demand classification and replenishment suggestions.
//!
//! Each product runs through the same pure pipeline:
//! aggregate → {classify, seasonality} → advise. Stages share no state, so
//! products can be analysed in any order or in parallel.

pub mod abnormal;
pub mod advisor;
pub mod aggregator;
pub mod batch;
pub mod classifier;
pub mod seasonality;
pub mod types;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::domain::movement::{validate_movements, AnalysisWindow, MovementRecord};
use crate::domain::product::ProductCode;
use crate::errors::DomainError;

use self::{
    abnormal::AbnormalSaleDetector,
    advisor::{AdvisorInput, DeterministicReplenishmentAdvisor, ReplenishmentAdvisor},
    aggregator::aggregate_movements,
    classifier::{DeterministicPatternClassifier, PatternClassifier},
    seasonality::{monthly_out_totals, DeterministicSeasonalityAnalyzer, SeasonalityAnalyzer},
    types::ProductAnalysis,
};

/// Everything the caller supplies for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAnalysisInput {
    pub product_code: ProductCode,
    pub window: AnalysisWindow,
    /// Reference date for age and staleness checks.
    pub now: NaiveDate,
    /// Movements inside `window`.
    pub movements: Vec<MovementRecord>,
    /// Longer history for seasonality; `movements` is used when absent.
    pub history: Option<Vec<MovementRecord>>,
    pub on_hand: f64,
    pub on_order: f64,
}

impl ProductAnalysisInput {
    pub fn new(
        product_code: impl Into<ProductCode>,
        window: AnalysisWindow,
        now: NaiveDate,
        movements: Vec<MovementRecord>,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            window,
            now,
            movements,
            history: None,
            on_hand: 0.0,
            on_order: 0.0,
        }
    }

    pub fn with_history(mut self, history: Vec<MovementRecord>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_stock(mut self, on_hand: f64, on_order: f64) -> Self {
        self.on_hand = on_hand;
        self.on_order = on_order;
        self
    }

    fn seasonal_history(&self) -> &[MovementRecord] {
        self.history.as_deref().unwrap_or(&self.movements)
    }
}

pub trait DemandRuntime: Send + Sync {
    fn analyze_product(&self, input: &ProductAnalysisInput)
        -> Result<ProductAnalysis, DomainError>;
}

pub struct DeterministicDemandRuntime<C, S, R> {
    classifier: C,
    seasonality: S,
    advisor: R,
    abnormal: AbnormalSaleDetector,
}

impl<C, S, R> DeterministicDemandRuntime<C, S, R> {
    pub fn new(classifier: C, seasonality: S, advisor: R) -> Self {
        Self { classifier, seasonality, advisor, abnormal: AbnormalSaleDetector::default() }
    }

    pub fn with_abnormal_detector(mut self, detector: AbnormalSaleDetector) -> Self {
        self.abnormal = detector;
        self
    }
}

impl Default
    for DeterministicDemandRuntime<
        DeterministicPatternClassifier,
        DeterministicSeasonalityAnalyzer,
        DeterministicReplenishmentAdvisor,
    >
{
    fn default() -> Self {
        Self::new(
            DeterministicPatternClassifier::default(),
            DeterministicSeasonalityAnalyzer::default(),
            DeterministicReplenishmentAdvisor,
        )
    }
}

impl
    DeterministicDemandRuntime<
        DeterministicPatternClassifier,
        DeterministicSeasonalityAnalyzer,
        DeterministicReplenishmentAdvisor,
    >
{
    /// Runtime tuned by the `[analysis]` config section.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            DeterministicPatternClassifier::new(config.classifier_thresholds()),
            DeterministicSeasonalityAnalyzer::new(config.seasonality_thresholds()),
            DeterministicReplenishmentAdvisor,
        )
        .with_abnormal_detector(AbnormalSaleDetector::new(config.abnormal_sale_multiplier))
    }
}

impl<C, S, R> DemandRuntime for DeterministicDemandRuntime<C, S, R>
where
    C: PatternClassifier,
    S: SeasonalityAnalyzer,
    R: ReplenishmentAdvisor,
{
    fn analyze_product(
        &self,
        input: &ProductAnalysisInput,
    ) -> Result<ProductAnalysis, DomainError> {
        input.window.validate()?;
        validate_movements(&input.movements)?;
        if let Some(history) = &input.history {
            validate_movements(history)?;
        }

        let summary = aggregate_movements(&input.product_code, &input.movements, &input.window);
        let monthly_totals = monthly_out_totals(&input.product_code, input.seasonal_history());
        let totals_finite = summary.total_in.is_finite()
            && summary.total_out.is_finite()
            && monthly_totals.iter().all(|total| total.is_finite());
        if !totals_finite {
            return Err(DomainError::QuantityOverflow {
                product_code: input.product_code.as_str().to_owned(),
            });
        }
        if !input.on_hand.is_finite() || !input.on_order.is_finite() {
            return Err(DomainError::InvalidStockPosition {
                product_code: input.product_code.as_str().to_owned(),
                reason: "on_hand and on_order must be finite".to_owned(),
            });
        }

        let classification = self.classifier.classify(&summary, input.now);
        let seasonality = self.seasonality.analyze(&monthly_totals);
        let suggestion = self.advisor.advise(&AdvisorInput {
            classification: &classification,
            seasonality: Some(&seasonality),
            on_hand: input.on_hand,
            on_order: input.on_order,
        });
        let abnormal_sales = self.abnormal.detect(&input.movements, &summary, &input.window);

        Ok(ProductAnalysis {
            product_code: input.product_code.clone(),
            reference_date: input.now,
            summary,
            classification,
            seasonality,
            suggestion,
            abnormal_sales,
        })
    }
}
