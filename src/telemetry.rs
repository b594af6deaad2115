//! Telemetry Module for the respond filter
//!
//! In Wasm, we emit structured logs that can be collected by
//! Envoy's access logging or external collectors.

use log::{error, info, warn};
use serde::Serialize;

/// Audit event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Downstream bytes drained and handed to the foreign function
    DataIntercepted,
    /// Processing aborted on a fatal condition
    StreamAborted,
    /// Per-stream totals, emitted when the stream is logged
    StreamSummary,
}

/// Audit event for logging
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Event type
    pub event_type: AuditEventType,
    /// Host-assigned stream context id
    pub context_id: u32,
    /// Foreign function called
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Bytes taken out of the downstream buffer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_intercepted: Option<u64>,
    /// Bytes the host reported for the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_reported: Option<u64>,
    /// Whether the callee returned an output buffer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_present: Option<bool>,
    /// Bytes returned by the callee
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_returned: Option<u64>,
    /// Data events handled on the stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<u64>,
    /// Failure kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    /// Reason for action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(event_type: AuditEventType, context_id: u32) -> Self {
        Self {
            event_type,
            context_id,
            function: None,
            bytes_intercepted: None,
            bytes_reported: None,
            output_present: None,
            bytes_returned: None,
            events: None,
            error: None,
            reason: None,
        }
    }

    pub fn with_function(mut self, function: &str) -> Self {
        self.function = Some(function.to_string());
        self
    }

    pub fn with_bytes_intercepted(mut self, bytes: u64) -> Self {
        self.bytes_intercepted = Some(bytes);
        self
    }

    pub fn with_bytes_reported(mut self, bytes: u64) -> Self {
        self.bytes_reported = Some(bytes);
        self
    }

    /// Record the callee's output, `None` when it returned no buffer
    pub fn with_output(mut self, output_len: Option<usize>) -> Self {
        self.output_present = Some(output_len.is_some());
        self.bytes_returned = output_len.map(|len| len as u64);
        self
    }

    pub fn with_bytes_returned(mut self, bytes: u64) -> Self {
        self.bytes_returned = Some(bytes);
        self
    }

    pub fn with_events(mut self, events: u64) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_error(mut self, kind: &'static str, reason: &str) -> Self {
        self.error = Some(kind);
        self.reason = Some(reason.to_string());
        self
    }

    /// Log the event
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => match self.event_type {
                AuditEventType::StreamAborted => error!("[RESPOND-AUDIT] {}", json),
                _ => info!("[RESPOND-AUDIT] {}", json),
            },
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
            }
        }
    }
}

/// Create an audit event for one intercepted data chunk
pub fn audit_intercepted(
    context_id: u32,
    function: &str,
    bytes: usize,
    output_len: Option<usize>,
) -> AuditEvent {
    AuditEvent::new(AuditEventType::DataIntercepted, context_id)
        .with_function(function)
        .with_bytes_intercepted(bytes as u64)
        .with_output(output_len)
}

/// Create an audit event for a fatal failure.
///
/// Only the reported size is known here; the failure may have happened
/// before anything was taken out of the buffer.
pub fn audit_aborted(
    context_id: u32,
    bytes_reported: usize,
    kind: &'static str,
    reason: &str,
) -> AuditEvent {
    AuditEvent::new(AuditEventType::StreamAborted, context_id)
        .with_bytes_reported(bytes_reported as u64)
        .with_error(kind, reason)
}

/// Create a per-stream summary audit event
pub fn audit_summary(
    context_id: u32,
    events: u64,
    bytes_intercepted: u64,
    bytes_returned: u64,
) -> AuditEvent {
    AuditEvent::new(AuditEventType::StreamSummary, context_id)
        .with_events(events)
        .with_bytes_intercepted(bytes_intercepted)
        .with_bytes_returned(bytes_returned)
}
