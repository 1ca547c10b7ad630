use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::demand::classifier::ClassifierThresholds;
use crate::demand::seasonality::SeasonalityThresholds;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Trailing months the classifier looks at.
    pub window_months: u32,
    pub new_product_days: i64,
    pub stale_after_days: i64,
    /// Receipt and issue count ceiling for order-driven categories.
    pub small_batch_limit: u32,
    /// Relative in/out imbalance a special order may carry.
    pub balance_tolerance: f64,
    pub stable_std_dev: f64,
    pub seasonal_concentration: f64,
    pub trend_run_months: usize,
    pub abnormal_sale_multiplier: f64,
    /// Worker threads for batch analysis, 0 = all cores.
    pub parallelism: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let classifier = ClassifierThresholds::default();
        let seasonality = SeasonalityThresholds::default();
        Self {
            window_months: 12,
            new_product_days: classifier.new_product_days,
            stale_after_days: classifier.stale_after_days,
            small_batch_limit: classifier.small_batch_limit,
            balance_tolerance: classifier.balance_tolerance,
            stable_std_dev: seasonality.stable_std_dev,
            seasonal_concentration: seasonality.seasonal_concentration,
            trend_run_months: seasonality.trend_run_months,
            abnormal_sale_multiplier: 3.0,
            parallelism: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn classifier_thresholds(&self) -> ClassifierThresholds {
        ClassifierThresholds {
            small_batch_limit: self.small_batch_limit,
            balance_tolerance: self.balance_tolerance,
            new_product_days: self.new_product_days,
            stale_after_days: self.stale_after_days,
            ..ClassifierThresholds::default()
        }
    }

    pub fn seasonality_thresholds(&self) -> SeasonalityThresholds {
        SeasonalityThresholds {
            stable_std_dev: self.stable_std_dev,
            seasonal_concentration: self.seasonal_concentration,
            trend_run_months: self.trend_run_months,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub window_months: Option<u32>,
    pub parallelism: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://stoktakip.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("stoktakip.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(analysis) = patch.analysis {
            if let Some(window_months) = analysis.window_months {
                self.analysis.window_months = window_months;
            }
            if let Some(new_product_days) = analysis.new_product_days {
                self.analysis.new_product_days = new_product_days;
            }
            if let Some(stale_after_days) = analysis.stale_after_days {
                self.analysis.stale_after_days = stale_after_days;
            }
            if let Some(small_batch_limit) = analysis.small_batch_limit {
                self.analysis.small_batch_limit = small_batch_limit;
            }
            if let Some(balance_tolerance) = analysis.balance_tolerance {
                self.analysis.balance_tolerance = balance_tolerance;
            }
            if let Some(stable_std_dev) = analysis.stable_std_dev {
                self.analysis.stable_std_dev = stable_std_dev;
            }
            if let Some(seasonal_concentration) = analysis.seasonal_concentration {
                self.analysis.seasonal_concentration = seasonal_concentration;
            }
            if let Some(trend_run_months) = analysis.trend_run_months {
                self.analysis.trend_run_months = trend_run_months;
            }
            if let Some(multiplier) = analysis.abnormal_sale_multiplier {
                self.analysis.abnormal_sale_multiplier = multiplier;
            }
            if let Some(parallelism) = analysis.parallelism {
                self.analysis.parallelism = parallelism;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOKTAKIP_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("STOKTAKIP_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("STOKTAKIP_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("STOKTAKIP_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_WINDOW_MONTHS") {
            self.analysis.window_months = parse_env("STOKTAKIP_ANALYSIS_WINDOW_MONTHS", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_NEW_PRODUCT_DAYS") {
            self.analysis.new_product_days =
                parse_env("STOKTAKIP_ANALYSIS_NEW_PRODUCT_DAYS", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_STALE_AFTER_DAYS") {
            self.analysis.stale_after_days =
                parse_env("STOKTAKIP_ANALYSIS_STALE_AFTER_DAYS", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_SMALL_BATCH_LIMIT") {
            self.analysis.small_batch_limit =
                parse_env("STOKTAKIP_ANALYSIS_SMALL_BATCH_LIMIT", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_BALANCE_TOLERANCE") {
            self.analysis.balance_tolerance =
                parse_env("STOKTAKIP_ANALYSIS_BALANCE_TOLERANCE", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_STABLE_STD_DEV") {
            self.analysis.stable_std_dev = parse_env("STOKTAKIP_ANALYSIS_STABLE_STD_DEV", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_SEASONAL_CONCENTRATION") {
            self.analysis.seasonal_concentration =
                parse_env("STOKTAKIP_ANALYSIS_SEASONAL_CONCENTRATION", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_TREND_RUN_MONTHS") {
            self.analysis.trend_run_months =
                parse_env("STOKTAKIP_ANALYSIS_TREND_RUN_MONTHS", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_ABNORMAL_SALE_MULTIPLIER") {
            self.analysis.abnormal_sale_multiplier =
                parse_env("STOKTAKIP_ANALYSIS_ABNORMAL_SALE_MULTIPLIER", &value)?;
        }
        if let Some(value) = read_env("STOKTAKIP_ANALYSIS_PARALLELISM") {
            self.analysis.parallelism = parse_env("STOKTAKIP_ANALYSIS_PARALLELISM", &value)?;
        }

        let log_level =
            read_env("STOKTAKIP_LOGGING_LEVEL").or_else(|| read_env("STOKTAKIP_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOKTAKIP_LOGGING_FORMAT").or_else(|| read_env("STOKTAKIP_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(window_months) = overrides.window_months {
            self.analysis.window_months = window_months;
        }
        if let Some(parallelism) = overrides.parallelism {
            self.analysis.parallelism = parallelism;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_analysis(&self.analysis)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Path of the config file `load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("stoktakip.toml"), PathBuf::from("config/stoktakip.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    if !(1..=60).contains(&analysis.window_months) {
        return Err(ConfigError::Validation(
            "analysis.window_months must be in range 1..=60".to_string(),
        ));
    }

    if analysis.new_product_days <= 0 || analysis.stale_after_days <= 0 {
        return Err(ConfigError::Validation(
            "analysis.new_product_days and analysis.stale_after_days must be positive".to_string(),
        ));
    }

    if analysis.small_batch_limit == 0 {
        return Err(ConfigError::Validation(
            "analysis.small_batch_limit must be at least 1".to_string(),
        ));
    }

    if !(analysis.balance_tolerance > 0.0 && analysis.balance_tolerance <= 1.0) {
        return Err(ConfigError::Validation(
            "analysis.balance_tolerance must be in range (0, 1]".to_string(),
        ));
    }

    if !(analysis.stable_std_dev > 0.0 && analysis.stable_std_dev.is_finite()) {
        return Err(ConfigError::Validation(
            "analysis.stable_std_dev must be a positive number".to_string(),
        ));
    }

    if !(analysis.seasonal_concentration > 0.0 && analysis.seasonal_concentration <= 1.0) {
        return Err(ConfigError::Validation(
            "analysis.seasonal_concentration must be in range (0, 1]".to_string(),
        ));
    }

    if !(2..=12).contains(&analysis.trend_run_months) {
        return Err(ConfigError::Validation(
            "analysis.trend_run_months must be in range 2..=12".to_string(),
        ));
    }

    if !(analysis.abnormal_sale_multiplier > 1.0) {
        return Err(ConfigError::Validation(
            "analysis.abnormal_sale_multiplier must be greater than 1.0".to_string(),
        ));
    }

    if analysis.parallelism > 256 {
        return Err(ConfigError::Validation(
            "analysis.parallelism must be at most 256 (0 uses every core)".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    analysis: Option<AnalysisPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    window_months: Option<u32>,
    new_product_days: Option<i64>,
    stale_after_days: Option<i64>,
    small_batch_limit: Option<u32>,
    balance_tolerance: Option<f64>,
    stable_std_dev: Option<f64>,
    seasonal_concentration: Option<f64>,
    trend_run_months: Option<usize>,
    abnormal_sale_multiplier: Option<f64>,
    parallelism: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{
        AppConfig, ClassifierThresholds, ConfigError, ConfigOverrides, LoadOptions, LogFormat,
        SeasonalityThresholds,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_engine_thresholds() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.analysis.window_months == 12, "default window should be 12 months")?;
        ensure(config.analysis.new_product_days == 60, "default new product age is 60 days")?;
        ensure(config.analysis.stale_after_days == 90, "default stale age is 90 days")?;
        ensure(config.analysis.parallelism == 0, "default parallelism uses every core")?;
        ensure(
            config.analysis.classifier_thresholds() == ClassifierThresholds::default(),
            "default classifier thresholds should match the engine",
        )?;
        ensure(
            config.analysis.seasonality_thresholds() == SeasonalityThresholds::default(),
            "default seasonality thresholds should match the engine",
        )?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_STOKTAKIP_DB", "sqlite://from-env-interpolation.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("stoktakip.toml");
            fs::write(
                &path,
                r#"
[database]
url = "${TEST_STOKTAKIP_DB}"

[analysis]
window_months = 24
abnormal_sale_multiplier = 4.5
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-env-interpolation.db",
                "database url should be interpolated from environment",
            )?;
            ensure(config.analysis.window_months == 24, "window should come from file")?;
            ensure(
                (config.analysis.abnormal_sale_multiplier - 4.5).abs() < f64::EPSILON,
                "multiplier should come from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_STOKTAKIP_DB"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STOKTAKIP_LOG_LEVEL", "warn");
        env::set_var("STOKTAKIP_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["STOKTAKIP_LOG_LEVEL", "STOKTAKIP_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STOKTAKIP_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("STOKTAKIP_ANALYSIS_PARALLELISM", "4");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("stoktakip.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[analysis]
parallelism = 2
stale_after_days = 120

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.analysis.parallelism == 4, "env parallelism should win over file")?;
            ensure(config.analysis.stale_after_days == 120, "file value should win over default")?;
            Ok(())
        })();

        clear_vars(&["STOKTAKIP_DATABASE_URL", "STOKTAKIP_ANALYSIS_PARALLELISM"]);
        result
    }

    #[test]
    fn engine_thresholds_load_from_file_and_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STOKTAKIP_ANALYSIS_TREND_RUN_MONTHS", "6");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("stoktakip.toml");
            fs::write(
                &path,
                r#"
[analysis]
small_batch_limit = 5
balance_tolerance = 0.25
stable_std_dev = 0.2
seasonal_concentration = 0.5
trend_run_months = 10
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let classifier = config.analysis.classifier_thresholds();
            let seasonality = config.analysis.seasonality_thresholds();
            ensure(classifier.small_batch_limit == 5, "batch limit should come from file")?;
            ensure(classifier.balance_tolerance == 0.25, "tolerance should come from file")?;
            ensure(seasonality.stable_std_dev == 0.2, "std-dev cutoff should come from file")?;
            ensure(seasonality.seasonal_concentration == 0.5, "concentration from file")?;
            ensure(seasonality.trend_run_months == 6, "env trend run should win over file")?;
            Ok(())
        })();

        clear_vars(&["STOKTAKIP_ANALYSIS_TREND_RUN_MONTHS"]);
        result
    }

    #[test]
    fn out_of_range_engine_thresholds_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let cases = [
            ("STOKTAKIP_ANALYSIS_SMALL_BATCH_LIMIT", "0", "analysis.small_batch_limit"),
            ("STOKTAKIP_ANALYSIS_BALANCE_TOLERANCE", "1.5", "analysis.balance_tolerance"),
            ("STOKTAKIP_ANALYSIS_STABLE_STD_DEV", "-0.1", "analysis.stable_std_dev"),
            ("STOKTAKIP_ANALYSIS_SEASONAL_CONCENTRATION", "0", "analysis.seasonal_concentration"),
            ("STOKTAKIP_ANALYSIS_TREND_RUN_MONTHS", "13", "analysis.trend_run_months"),
        ];

        let mut outcome = Ok(());
        for (key, value, field) in cases {
            env::set_var(key, value);
            let result = AppConfig::load(LoadOptions::default());
            clear_vars(&[key]);

            let named = matches!(result, Err(ConfigError::Validation(ref m)) if m.contains(field));
            if !named {
                outcome = Err(format!("{key}={value} should fail validation naming {field}"));
                break;
            }
        }
        outcome
    }

    #[test]
    fn invalid_env_number_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STOKTAKIP_ANALYSIS_WINDOW_MONTHS", "twelve");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override failure".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "STOKTAKIP_ANALYSIS_WINDOW_MONTHS", "error should name the key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(&["STOKTAKIP_ANALYSIS_WINDOW_MONTHS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { window_months: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("analysis.window_months")
        );
        ensure(has_message, "validation failure should mention analysis.window_months")
    }

    #[test]
    fn non_sqlite_database_url_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("mssql://erp/stok".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("database.url")),
            "non-sqlite urls should be rejected",
        )
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;

        let result = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should fail",
        )
    }
}
