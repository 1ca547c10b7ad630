pub mod config;
pub mod demand;
pub mod domain;
pub mod errors;

pub use demand::abnormal::AbnormalSaleDetector;
pub use demand::advisor::{AdvisorInput, DeterministicReplenishmentAdvisor, ReplenishmentAdvisor};
pub use demand::aggregator::aggregate_movements;
pub use demand::batch::{BatchAnalyzer, BatchReport, ProductOutcome};
pub use demand::classifier::{
    ClassifierThresholds, DeterministicPatternClassifier, PatternClassifier,
};
pub use demand::seasonality::{
    monthly_out_totals, DeterministicSeasonalityAnalyzer, SeasonalityAnalyzer,
    SeasonalityThresholds,
};
pub use demand::types::{
    AbnormalSale, DemandCategory, DemandClassification, MonthlyTotals, ProductAnalysis,
    ProductMovementSummary, ReplenishmentReason, ReplenishmentSuggestion, SeasonalPatternType,
    SeasonalProfile, StrategyHint,
};
pub use demand::{DemandRuntime, DeterministicDemandRuntime, ProductAnalysisInput};
pub use domain::movement::{AnalysisWindow, Direction, DocumentKind, MovementRecord};
pub use domain::product::ProductCode;
pub use domain::stock::StockPosition;
pub use errors::{ApplicationError, DomainError, InterfaceError};
