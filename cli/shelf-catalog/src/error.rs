//! Error handling for catalog API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Common error type for catalog API operations.
///
/// Only failures of the primary request of an operation surface as errors.
/// Secondary lookups (work and author details) are best effort and never
/// produce a [CatalogClientError].
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}")]
    UnexpectedStatus { url: String, status: StatusCode },
    #[error("could not decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The response decoded, but the field carrying the results is absent.
    #[error("response from {endpoint} is missing the '{field}' field")]
    MissingField {
        endpoint: &'static str,
        field: &'static str,
    },
    #[error("{}", .0)]
    Other(String),
}
