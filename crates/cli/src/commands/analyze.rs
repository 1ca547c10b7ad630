use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::commands::{
    build_runtime, config_failure, interface_message, persistence_message, CommandResult,
    StepError,
};
use stoktakip_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use stoktakip_core::demand::batch::{BatchAnalyzer, BatchReport, ProductOutcome};
use stoktakip_core::demand::{DeterministicDemandRuntime, ProductAnalysisInput};
use stoktakip_core::domain::movement::AnalysisWindow;
use stoktakip_core::domain::product::ProductCode;
use stoktakip_core::domain::stock::StockPosition;
use stoktakip_core::errors::ApplicationError;
use stoktakip_db::{
    connect_with_settings, migrations, MovementRepository, RepositoryError, SqlMovementRepository,
};

#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub now: Option<NaiveDate>,
    pub product: Option<String>,
    pub window_months: Option<u32>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutcome<'a> {
    command: &'static str,
    status: &'static str,
    report: &'a BatchReport,
}

pub fn run(args: AnalyzeArgs) -> CommandResult {
    let options = LoadOptions {
        overrides: ConfigOverrides {
            window_months: args.window_months,
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return config_failure("analyze", error),
    };

    let now = args.now.unwrap_or_else(|| Local::now().date_naive());
    let window = match AnalysisWindow::trailing_months(now, config.analysis.window_months) {
        Ok(window) => window,
        Err(error) => {
            let message = interface_message("analyze", ApplicationError::from(error));
            return CommandResult::failure("analyze", "analysis", message, 6);
        }
    };

    let runtime = match build_runtime("analyze") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let inputs = runtime.block_on(load_inputs(&config, window, now, args.product.as_deref()));
    let inputs = match inputs {
        Ok(inputs) => inputs,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("analyze", error_class, message, exit_code);
        }
    };

    info!(
        event_name = "cli.analyze.inputs_loaded",
        product_count = inputs.len(),
        window_start = %window.start(),
        window_end = %window.end(),
        "analysis inputs loaded"
    );

    let analyzer = BatchAnalyzer::new(
        DeterministicDemandRuntime::from_config(&config.analysis),
        config.analysis.parallelism,
    );
    let report = match analyzer.run(&inputs) {
        Ok(report) => report,
        Err(error) => {
            return CommandResult::failure(
                "analyze",
                "analysis",
                interface_message("analyze", error),
                6,
            );
        }
    };

    if args.json {
        render_json(&report)
    } else {
        CommandResult::success("analyze", render_lines(&report))
    }
}

async fn load_inputs(
    config: &AppConfig,
    window: AnalysisWindow,
    now: NaiveDate,
    product: Option<&str>,
) -> Result<Vec<ProductAnalysisInput>, StepError> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", persistence_message("analyze", error), 4u8))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", persistence_message("analyze", error), 5u8))?;

    let repo = SqlMovementRepository::new(pool.clone());
    let result = collect_inputs(&repo, window, now, product).await;
    pool.close().await;
    result
}

/// Builds one engine input per product: the window's movements, the full
/// history up to the window end for seasonality, and the stock position.
pub async fn collect_inputs<R>(
    repo: &R,
    window: AnalysisWindow,
    now: NaiveDate,
    product: Option<&str>,
) -> Result<Vec<ProductAnalysisInput>, StepError>
where
    R: MovementRepository + ?Sized,
{
    let known = repo.list_product_codes().await.map_err(query_error)?;
    let codes = match product {
        Some(code) => {
            let code = ProductCode::new(code.trim());
            if !known.contains(&code) {
                return Err((
                    "unknown_product",
                    format!("product `{code}` has no movements or stock position"),
                    6,
                ));
            }
            vec![code]
        }
        None => known,
    };

    let mut inputs = Vec::with_capacity(codes.len());
    for code in codes {
        let movements = repo
            .find_movements(&code, Some(window.start()), window.end())
            .await
            .map_err(query_error)?;
        let history = repo.find_movements(&code, None, window.end()).await.map_err(query_error)?;
        let position = repo
            .find_stock_position(&code)
            .await
            .map_err(query_error)?
            .unwrap_or_else(|| StockPosition::empty(code.clone()));

        inputs.push(
            ProductAnalysisInput::new(code, window, now, movements)
                .with_history(history)
                .with_stock(position.on_hand, position.on_order),
        );
    }
    Ok(inputs)
}

fn query_error(error: RepositoryError) -> StepError {
    ("db_query", interface_message("analyze", ApplicationError::from(error)), 4)
}

fn render_json(report: &BatchReport) -> CommandResult {
    let payload = AnalyzeOutcome { command: "analyze", status: "ok", report };
    match serde_json::to_string_pretty(&payload) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("analyze", "serialization", error.to_string(), 6),
    }
}

fn render_lines(report: &BatchReport) -> String {
    let as_of = report
        .reference_date
        .map(|date| date.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut lines = vec![format!(
        "analysed {} of {} products as of {as_of} (run {})",
        report.analyzed(),
        report.outcomes.len(),
        report.run_id
    )];

    for outcome in &report.outcomes {
        let line = match outcome {
            ProductOutcome::Analyzed(analysis) => {
                let demand = analysis
                    .classification
                    .normalized_monthly_demand
                    .map(|demand| format!("{demand:.2}/month"))
                    .unwrap_or_else(|| "n/a".to_string());
                format!(
                    "  - {}: {} demand={demand} order={:.2} ({})",
                    analysis.product_code,
                    analysis.classification.category.as_str(),
                    analysis.suggestion.recommended_quantity,
                    analysis.suggestion.reason.code()
                )
            }
            ProductOutcome::Failed { product_code, error } => {
                format!("  - {product_code}: failed ({error})")
            }
        };
        lines.push(line);
    }

    lines.push(format!("total recommended quantity: {:.2}", report.total_recommended_quantity));
    lines.join("\n")
}
