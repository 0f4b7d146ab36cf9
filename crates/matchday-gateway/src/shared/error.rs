use matchday_core::CoreError;
use thiserror::Error;

/// Gateway-wide error taxonomy.
///
/// Every member is caught at the boundary of its owning component and
/// surfaced as a structured object; none crosses the Tool Gateway as an
/// unhandled fault.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("External API error: {0}")]
    ExternalApi(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Assignment conflict: {0}")]
    AssignmentConflict(String),
    #[error("Assignment not found: {0}")]
    AssignmentNotFound(String),
}

impl From<CoreError> for GatewayError {
    fn from(err: CoreError) -> Self {
        match err {
            // Malformed identifiers in backend responses are data-integrity
            // failures of the external system, not caller mistakes.
            CoreError::InvalidInstanceId(_) | CoreError::InvalidImageId(_) => {
                GatewayError::ExternalApi(err.to_string())
            }
            CoreError::UnknownInstanceState(_) => GatewayError::Validation(err.to_string()),
            CoreError::UnknownProject(_) => GatewayError::Configuration(err.to_string()),
            CoreError::SerializationError(_) => GatewayError::Storage(err.to_string()),
        }
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
