//! kankasync API - Kanka REST API client
//!
//! Provides async client for:
//! - Bearer-authenticated requests against the campaigns API
//! - Paginated collection listing (following `links.next`)
//! - Entity, post and tag create/update calls
//!
//! ## Modules
//!
//! - [`client`] - HTTP client with base URL and bearer credential
//! - [`pages`] - Paginated listing of collections and campaigns
//! - [`provider`] - [`IRemoteClient`](kankasync_core::ports::IRemoteClient) implementation

pub mod client;
pub mod pages;
pub mod provider;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the Kanka API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The bearer token is missing, invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The token cannot access the requested campaign
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server-side request budget was exceeded
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other non-success status
    #[error("Unexpected status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The resource cannot be addressed (e.g. an undefined entity type)
    #[error("Unroutable resource: {0}")]
    Unroutable(String),
}

impl ApiError {
    /// Classifies a non-success status
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::TooManyRequests(message),
            s if s.is_server_error() => ApiError::ServerError(message),
            s => ApiError::Status {
                status: s.as_u16(),
                message,
            },
        }
    }
}
