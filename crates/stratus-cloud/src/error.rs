use crate::ProviderKind;

/// Errors raised while talking to a cloud metadata service.
///
/// None of these escape the crate's public collection paths: the prober
/// treats them as "not this provider" and the harvester drops the affected
/// field.
///
/// # Examples
///
/// ```rust
/// use stratus_cloud::error::CloudError;
/// use stratus_cloud::ProviderKind;
///
/// let err = CloudError::MissingField {
///     provider: ProviderKind::Aws,
///     field: "kernelId".to_string(),
/// };
/// assert!(err.to_string().contains("kernelId"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The metadata service answered with a non-2xx status.
    #[error("metadata service {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The request did not complete within its timeout.
    #[error("metadata service {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u128 },

    /// The metadata service could not be reached.
    #[error("metadata service {url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// An underlying HTTP transport error from `reqwest`.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The metadata document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An expected field is absent from the provider's metadata document.
    #[error("{provider} metadata document has no field '{field}'")]
    MissingField {
        provider: ProviderKind,
        field: String,
    },
}

/// Convenience type alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, CloudError>;
