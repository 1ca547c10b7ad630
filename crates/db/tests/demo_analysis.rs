use chrono::NaiveDate;

use stoktakip_core::demand::batch::BatchAnalyzer;
use stoktakip_core::demand::types::{DemandCategory, ReplenishmentReason, StrategyHint};
use stoktakip_core::demand::{DeterministicDemandRuntime, ProductAnalysisInput};
use stoktakip_core::domain::movement::AnalysisWindow;
use stoktakip_core::domain::stock::StockPosition;
use stoktakip_db::fixtures::DEMO_REFERENCE_DATE;
use stoktakip_db::{
    connect_with_settings, migrations, DemoInventoryDataset, MovementRepository,
    SqlMovementRepository,
};

type DemoTestResult<T = ()> = Result<T, String>;

async fn seeded_inputs() -> DemoTestResult<Vec<ProductAnalysisInput>> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoInventoryDataset::load(&pool).await.map_err(|error| format!("seed: {error}"))?;

    let repo = SqlMovementRepository::new(pool);
    let now = NaiveDate::parse_from_str(DEMO_REFERENCE_DATE, "%Y-%m-%d")
        .map_err(|error| format!("reference date: {error}"))?;
    let window = AnalysisWindow::trailing_months(now, 12).map_err(|error| error.to_string())?;

    let mut inputs = Vec::new();
    for code in repo.list_product_codes().await.map_err(|error| error.to_string())? {
        let movements = repo
            .find_movements(&code, Some(window.start()), window.end())
            .await
            .map_err(|error| error.to_string())?;
        let history =
            repo.find_movements(&code, None, window.end()).await.map_err(|e| e.to_string())?;
        let position = repo
            .find_stock_position(&code)
            .await
            .map_err(|error| error.to_string())?
            .unwrap_or_else(|| StockPosition::empty(code.clone()));

        inputs.push(
            ProductAnalysisInput::new(code, window, now, movements)
                .with_history(history)
                .with_stock(position.on_hand, position.on_order),
        );
    }
    Ok(inputs)
}

#[tokio::test]
async fn every_demo_product_lands_in_its_category() -> DemoTestResult {
    let inputs = seeded_inputs().await?;
    let report = BatchAnalyzer::new(DeterministicDemandRuntime::default(), 2)
        .run(&inputs)
        .map_err(|error| error.to_string())?;

    let expected = [
        ("JENERATOR-5KVA", DemandCategory::DemandDriven),
        ("KABLO-NYA-3X2.5", DemandCategory::Regular),
        ("KLIMA-12000BTU", DemandCategory::Seasonal),
        ("LED-PANEL-60X60", DemandCategory::NewProduct),
        ("PANO-OZEL-120", DemandCategory::SpecialOrder),
        ("SIGORTA-C16", DemandCategory::DeadStock),
    ];
    assert_eq!(report.outcomes.len(), expected.len());
    assert_eq!(report.failed, 0);

    for (outcome, (code, category)) in report.outcomes.iter().zip(expected) {
        let analysis = outcome.analysis().ok_or_else(|| format!("{code} was not analysed"))?;
        assert_eq!(analysis.product_code.as_str(), code);
        assert_eq!(analysis.classification.category, category, "category of {code}");
    }
    Ok(())
}

#[tokio::test]
async fn demo_suggestions_follow_the_decision_table() -> DemoTestResult {
    let inputs = seeded_inputs().await?;
    let report = BatchAnalyzer::new(DeterministicDemandRuntime::default(), 1)
        .run(&inputs)
        .map_err(|error| error.to_string())?;
    let find = |code: &str| {
        report
            .outcomes
            .iter()
            .filter_map(|outcome| outcome.analysis())
            .find(|analysis| analysis.product_code.as_str() == code)
            .ok_or_else(|| format!("{code} missing from report"))
    };

    // 24 issues of 60/40 plus a 20 issue cancelled by its return: 1200 over 12 months.
    let kablo = find("KABLO-NYA-3X2.5")?;
    assert_eq!(kablo.classification.normalized_monthly_demand, Some(100.0));
    assert_eq!(kablo.suggestion.reason, ReplenishmentReason::BelowMonthlyDemand);
    assert_eq!(kablo.suggestion.recommended_quantity, 120.0);

    let klima = find("KLIMA-12000BTU")?;
    assert_eq!(klima.classification.normalized_monthly_demand, Some(50.0));
    assert_eq!(klima.suggestion.reason, ReplenishmentReason::SeasonalBuffer);
    assert_eq!(klima.suggestion.recommended_quantity, 150.0);
    assert_eq!(klima.suggestion.open_order_quantity, 100.0);
    assert_eq!(klima.seasonality.peak_month, 7);

    let jenerator = find("JENERATOR-5KVA")?;
    assert_eq!(jenerator.classification.strategy_hint, StrategyHint::SupplyOnDemand);
    assert_eq!(jenerator.suggestion.recommended_quantity, 0.0);

    let sigorta = find("SIGORTA-C16")?;
    assert_eq!(sigorta.classification.strategy_hint, StrategyHint::Liquidate);
    assert_eq!(sigorta.suggestion.recommended_quantity, 0.0);

    assert_eq!(report.total_recommended_quantity, 270.0);
    Ok(())
}
