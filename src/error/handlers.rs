//! Standardized HTTP failure messages for registry exchanges

use crate::error::TransferError;
use reqwest::StatusCode;
use std::fmt;

/// Turns registry HTTP statuses into `Registry` errors with operation context
pub struct StatusErrorHandler;

impl StatusErrorHandler {
    /// Build the error for a non-success status
    pub fn handle_status(
        status: StatusCode,
        error_text: &str,
        operation: &str,
        target: impl fmt::Display,
    ) -> TransferError {
        let message = match status.as_u16() {
            401 => format!("unauthorized (status {}): {}", status, error_text),
            403 => format!("forbidden, insufficient permissions: {}", error_text),
            404 => format!("not found: {}", error_text),
            429 => format!("rate limited: {}", error_text),
            500 => format!("registry server error: {}", error_text),
            502 | 503 => format!("registry unavailable (status {}): {}", status, error_text),
            _ => format!("unexpected status {}: {}", status, error_text),
        };
        TransferError::registry(operation, target, message)
    }
}

/// Categorizes reqwest transport failures
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    pub fn handle_network_error(
        error: &reqwest::Error,
        operation: &str,
        target: impl fmt::Display,
    ) -> TransferError {
        let message = if error.is_timeout() {
            format!("timed out: {}", error)
        } else if error.is_connect() {
            format!("connection error: {}", error)
        } else if error.is_body() || error.is_decode() {
            format!("reading response body: {}", error)
        } else {
            format!("network error: {}", error)
        };
        TransferError::registry(operation, target, message)
    }
}
