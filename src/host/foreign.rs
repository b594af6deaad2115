//! Foreign Function Call
//!
//! One blocking call into a named host capability per invocation. No
//! retries, no timeout. Any output buffer the callee allocated belongs to
//! the caller, which must release it exactly once; [`OwnedOutput`] does
//! that on drop so neither a leak nor a double release can be written.

use proxy_wasm::hostcalls;
use proxy_wasm::types::{Bytes, Status};

/// Releases output buffers handed over by a foreign call
pub trait Deallocate {
    fn deallocate(&self, output: Bytes);
}

/// Output buffer returned by the callee, owned by the caller.
///
/// Zero-length output is still an allocation and is released like any
/// other; absence of output is represented by not having an `OwnedOutput`.
pub struct OwnedOutput<'a> {
    bytes: Option<Bytes>,
    owner: &'a dyn Deallocate,
}

impl<'a> OwnedOutput<'a> {
    pub fn new(bytes: Bytes, owner: &'a dyn Deallocate) -> Self {
        Self {
            bytes: Some(bytes),
            owner,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Hand the buffer back to its allocator now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for OwnedOutput<'_> {
    fn drop(&mut self) {
        if let Some(bytes) = self.bytes.take() {
            self.owner.deallocate(bytes);
        }
    }
}

impl std::fmt::Debug for OwnedOutput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedOutput")
            .field("len", &self.len())
            .finish()
    }
}

/// Status reported by the callee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Ok,
    Error(Status),
}

/// Outcome of a single foreign call
#[derive(Debug)]
pub struct ForeignCallResult<'a> {
    pub status: CallStatus,
    pub output: Option<OwnedOutput<'a>>,
}

/// Synchronous call into a named foreign function
pub trait ForeignCallInvoker {
    fn invoke(&self, function: &str, request: &[u8]) -> ForeignCallResult<'_>;
}

/// Foreign calls through the proxy-wasm host calls
#[derive(Debug, Default, Clone, Copy)]
pub struct HostForeignCall;

impl Deallocate for HostForeignCall {
    fn deallocate(&self, output: Bytes) {
        // The host filled memory it got from proxy_on_memory_allocate, which
        // is this module's global allocator.
        drop(output);
    }
}

impl ForeignCallInvoker for HostForeignCall {
    fn invoke(&self, function: &str, request: &[u8]) -> ForeignCallResult<'_> {
        match hostcalls::call_foreign_function(function, Some(request)) {
            Ok(output) => ForeignCallResult {
                status: CallStatus::Ok,
                output: output.map(|bytes| OwnedOutput::new(bytes, self)),
            },
            Err(status) => ForeignCallResult {
                status: CallStatus::Error(status),
                output: None,
            },
        }
    }
}
