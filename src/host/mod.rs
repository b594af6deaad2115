//! Host-facing seams of the filter
//!
//! This module provides:
//! - Downstream buffer access (snapshot read and drain)
//! - The synchronous foreign function call and ownership of its output

pub mod buffer;
pub mod foreign;

pub use buffer::{BufferAccessor, BufferSnapshot, HostBuffer};
pub use foreign::{CallStatus, Deallocate, ForeignCallInvoker, ForeignCallResult, HostForeignCall, OwnedOutput};
