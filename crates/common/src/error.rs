//! Common error types shared across crates.

use thiserror::Error;

/// Top-level function error type.
///
/// Only [`ServiceError::Setup`] is fatal; it is raised before the runtime loop
/// starts. Every other variant is either logged and absorbed
/// ([`ServiceError::TelemetryExport`]) or returned to the Lambda runtime as the
/// invocation's error payload.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The execution environment or credentials cannot be established.
    #[error("setup failed: {0}")]
    Setup(String),

    /// An OTLP exporter could not be constructed; the signal runs inert.
    #[error("{signal} exporter unavailable: {reason}")]
    TelemetryExport {
        /// Telemetry signal (`traces`, `metrics`, `logs`).
        signal: &'static str,
        /// Exporter build error, as reported by the SDK.
        reason: String,
    },

    /// Network-level failure on the outbound call, message kept verbatim.
    #[error("{0}")]
    Transport(String),

    /// The dependency answered with a status code other than 200.
    #[error("non 200 response found: {0}")]
    NonSuccessResponse(u16),

    /// The dependency answered 200 without a usable payload.
    #[error("no IP in HTTP response")]
    EmptyResponse,
}

impl ServiceError {
    /// Whether the process must stop instead of serving invocations.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServiceError::Setup(_))
    }

    /// Stable identifier reported to the runtime as the `errorType`.
    pub fn error_type(&self) -> &'static str {
        match self {
            ServiceError::Setup(_) => "SetupFailure",
            ServiceError::TelemetryExport { .. } => "TelemetryExportFailure",
            ServiceError::Transport(_) => "TransportError",
            ServiceError::NonSuccessResponse(_) => "NonSuccessResponse",
            ServiceError::EmptyResponse => "EmptyResponse",
        }
    }
}
