use crate::commands::{
    build_runtime, config_failure, interface_message, persistence_message, CommandResult,
    StepError,
};
use stoktakip_core::config::{AppConfig, LoadOptions};
use stoktakip_core::errors::ApplicationError;
use stoktakip_db::fixtures::DEMO_REFERENCE_DATE;
use stoktakip_db::{connect_with_settings, migrations, DemoInventoryDataset, ProductSeedInfo};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return config_failure("seed", error),
    };

    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", persistence_message("seed", error), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", persistence_message("seed", error), 5u8))?;

        let seed_result = DemoInventoryDataset::load(&pool).await.map_err(|error| {
            ("seed_execution", interface_message("seed", ApplicationError::from(error)), 5u8)
        })?;

        let verification = DemoInventoryDataset::verify(&pool).await.map_err(|error| {
            ("seed_verification", interface_message("seed", ApplicationError::from(error)), 5u8)
        })?;

        let run_result: Result<Vec<ProductSeedInfo>, StepError> = if verification.all_present {
            Ok(seed_result.products_seeded)
        } else {
            Err(("seed_verification", verification_failure_message(&verification.checks), 5u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(products) => {
            let product_lines: Vec<String> = products
                .iter()
                .map(|product| {
                    format!(
                        "  - {} [{}]: {}",
                        product.product_code, product.expected_category, product.description
                    )
                })
                .collect();
            let message = format!(
                "demo inventory loaded; analyse with --now {DEMO_REFERENCE_DATE}:\n{}",
                product_lines.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_failure_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "some seed data failed to load".to_string()
    } else {
        format!("seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
