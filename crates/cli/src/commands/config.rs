use std::env;
use std::fs;
use std::path::Path;

use stoktakip_core::config::{resolve_config_path, AppConfig, LoadOptions, LogFormat};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries: [(&str, String, &[&str]); 15] = [
        ("database.url", config.database.url.clone(), &["STOKTAKIP_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["STOKTAKIP_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["STOKTAKIP_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "analysis.window_months",
            config.analysis.window_months.to_string(),
            &["STOKTAKIP_ANALYSIS_WINDOW_MONTHS"],
        ),
        (
            "analysis.new_product_days",
            config.analysis.new_product_days.to_string(),
            &["STOKTAKIP_ANALYSIS_NEW_PRODUCT_DAYS"],
        ),
        (
            "analysis.stale_after_days",
            config.analysis.stale_after_days.to_string(),
            &["STOKTAKIP_ANALYSIS_STALE_AFTER_DAYS"],
        ),
        (
            "analysis.small_batch_limit",
            config.analysis.small_batch_limit.to_string(),
            &["STOKTAKIP_ANALYSIS_SMALL_BATCH_LIMIT"],
        ),
        (
            "analysis.balance_tolerance",
            config.analysis.balance_tolerance.to_string(),
            &["STOKTAKIP_ANALYSIS_BALANCE_TOLERANCE"],
        ),
        (
            "analysis.stable_std_dev",
            config.analysis.stable_std_dev.to_string(),
            &["STOKTAKIP_ANALYSIS_STABLE_STD_DEV"],
        ),
        (
            "analysis.seasonal_concentration",
            config.analysis.seasonal_concentration.to_string(),
            &["STOKTAKIP_ANALYSIS_SEASONAL_CONCENTRATION"],
        ),
        (
            "analysis.trend_run_months",
            config.analysis.trend_run_months.to_string(),
            &["STOKTAKIP_ANALYSIS_TREND_RUN_MONTHS"],
        ),
        (
            "analysis.abnormal_sale_multiplier",
            config.analysis.abnormal_sale_multiplier.to_string(),
            &["STOKTAKIP_ANALYSIS_ABNORMAL_SALE_MULTIPLIER"],
        ),
        (
            "analysis.parallelism",
            render_parallelism(config.analysis.parallelism),
            &["STOKTAKIP_ANALYSIS_PARALLELISM"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["STOKTAKIP_LOGGING_LEVEL", "STOKTAKIP_LOG_LEVEL"],
        ),
        (
            "logging.format",
            render_format(config.logging.format).to_string(),
            &["STOKTAKIP_LOGGING_FORMAT", "STOKTAKIP_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in entries {
        let source = field_source(
            key,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key, &value, source));
    }
    lines.join("\n")
}

fn render_parallelism(parallelism: usize) -> String {
    if parallelism == 0 {
        "0 (all cores)".to_string()
    } else {
        parallelism.to_string()
    }
}

fn render_format(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
