/// Errors that can occur while exporting stats to the remote collector.
///
/// Only [`ExportError::MissingConfig`] is fatal: it aborts exporter
/// construction. Delivery errors are logged by the exporter and the batch is
/// dropped.
///
/// # Examples
///
/// ```rust
/// use stratus_export::error::ExportError;
///
/// let err = ExportError::MissingConfig("api_key");
/// assert!(err.to_string().contains("api_key"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A required export setting is absent or blank.
    #[error("Export: missing required setting '{0}'")]
    MissingConfig(&'static str),

    /// The collector answered with a non-2xx status.
    #[error("Export: collector {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The collector refused or never accepted the connection.
    #[error("Export: cannot reach {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// An underlying HTTP transport error from `reqwest`.
    #[error("Export: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The payload could not be serialized.
    #[error("Export: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the dump file failed.
    #[error("Export: I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
