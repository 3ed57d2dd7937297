use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum HansFoodError {
    StoreError(String),
    StateTransitionError(String),
    ValidationError(String),
    SensorError(String),
    ConfigurationError(String),
    EventError(String),
}

impl fmt::Display for HansFoodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HansFoodError::StoreError(msg) => write!(f, "Store error: {msg}"),
            HansFoodError::StateTransitionError(msg) => write!(f, "State transition error: {msg}"),
            HansFoodError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            HansFoodError::SensorError(msg) => write!(f, "Sensor error: {msg}"),
            HansFoodError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            HansFoodError::EventError(msg) => write!(f, "Event error: {msg}"),
        }
    }
}

impl std::error::Error for HansFoodError {}

pub type Result<T> = std::result::Result<T, HansFoodError>;
