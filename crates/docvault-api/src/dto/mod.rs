//! Request and response DTOs.

pub mod request;
pub mod response;

use validator::Validate;

use docvault_core::error::AppError;

/// Run `validator` rules, flattening failures into one validation error.
pub fn validate<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}
