use chrono::NaiveDate;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid analysis window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("negative quantity {quantity} for product `{product_code}` on {date}")]
    NegativeQuantity { product_code: String, date: NaiveDate, quantity: f64 },
    #[error("non-finite quantity {quantity} for product `{product_code}` on {date}")]
    NonFiniteQuantity { product_code: String, date: NaiveDate, quantity: f64 },
    #[error("quantities for product `{product_code}` overflow when totalled")]
    QuantityOverflow { product_code: String },
    #[error("invalid stock position for product `{product_code}`: {reason}")]
    InvalidStockPosition { product_code: String, reason: String },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("runtime failure: {0}")]
    Runtime(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The movement data could not be analysed. Check the window and quantities."
            }
            Self::ServiceUnavailable { .. } => {
                "The inventory store is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) | ApplicationError::Runtime(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn invalid_window_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::InvalidWindow {
            start: date(2025, 6, 1),
            end: date(2025, 1, 1),
        })
        .into_interface("run-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "run-1"
        ));
    }

    #[test]
    fn negative_quantity_message_names_the_product() {
        let error = DomainError::NegativeQuantity {
            product_code: "KBL-001".to_owned(),
            date: date(2025, 3, 4),
            quantity: -2.5,
        };

        let message = error.to_string();
        assert!(message.contains("KBL-001"));
        assert!(message.contains("2025-03-04"));
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Persistence("database is locked".to_owned())
            .into_interface("run-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The inventory store is temporarily unavailable. Please retry shortly."
        );
        assert_eq!(interface.correlation_id(), "run-3");
    }

    #[test]
    fn runtime_error_maps_to_internal() {
        let interface =
            ApplicationError::Runtime("thread pool init failed".to_owned()).into_interface("run-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
