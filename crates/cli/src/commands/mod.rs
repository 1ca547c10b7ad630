pub mod analyze;
pub mod config;
pub mod migrate;
pub mod seed;

use serde::Serialize;
use stoktakip_core::errors::ApplicationError;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Error triple threaded through async command bodies: class, message, exit code.
pub(crate) type StepError = (&'static str, String, u8);

/// User-facing hint, detail, and a correlation id for matching the failure
/// against the logs.
pub(crate) fn interface_message(command: &str, error: ApplicationError) -> String {
    let interface = error.into_interface(format!("{command}-{}", Uuid::new_v4()));
    format!(
        "{} {interface} (correlation_id={})",
        interface.user_message(),
        interface.correlation_id()
    )
}

pub(crate) fn config_failure(command: &str, error: impl std::fmt::Display) -> CommandResult {
    CommandResult::failure(
        command,
        "config_validation",
        interface_message(command, ApplicationError::Configuration(error.to_string())),
        2,
    )
}

pub(crate) fn persistence_message(command: &str, error: impl std::fmt::Display) -> String {
    interface_message(command, ApplicationError::Persistence(error.to_string()))
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            interface_message(
                command,
                ApplicationError::Runtime(format!("failed to initialize async runtime: {error}")),
            ),
            3,
        )
    })
}
