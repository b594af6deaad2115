//! Fatal conditions of the downstream data path
//!
//! None of these are recoverable inside the filter. The stream context
//! turns every one of them into an abort of the module.

use proxy_wasm::types::Status;

/// Failure detected while handling a downstream data event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The downstream buffer region could not be read
    BufferUnavailable {
        length: usize,
        status: Option<Status>,
    },
    /// The host rejected the drain of the downstream buffer
    BufferWriteError { length: usize, status: Status },
    /// The foreign function reported an error status
    ForeignCallFailed { function: String, status: Status },
}

impl FilterError {
    /// Short machine-friendly name, used in audit events
    pub fn kind(&self) -> &'static str {
        match self {
            FilterError::BufferUnavailable { .. } => "buffer_unavailable",
            FilterError::BufferWriteError { .. } => "buffer_write_error",
            FilterError::ForeignCallFailed { .. } => "foreign_call_failed",
        }
    }
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::BufferUnavailable { length, status } => {
                write!(
                    f,
                    "failed to access {} bytes in the downstream buffer",
                    length
                )?;
                if let Some(status) = status {
                    write!(f, " (status {:?})", status)?;
                }
                Ok(())
            }
            FilterError::BufferWriteError { length, status } => write!(
                f,
                "failed to drain {} bytes from the downstream buffer (status {:?})",
                length, status
            ),
            FilterError::ForeignCallFailed { function, status } => {
                write!(f, "{} call returned an error (status {:?})", function, status)
            }
        }
    }
}
