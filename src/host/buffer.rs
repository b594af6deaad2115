//! Downstream Buffer Access
//!
//! The host owns the per-stream buffer. The filter reads a snapshot of
//! the bytes that just arrived and then drains that region so the
//! original payload never travels further down the filter chain.

use proxy_wasm::hostcalls;
use proxy_wasm::types::{BufferType, Bytes, Status};

use crate::error::FilterError;

/// Bytes copied out of a host buffer during one event callback
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferSnapshot {
    bytes: Bytes,
}

impl BufferSnapshot {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Read and drain access to a host-managed buffer
pub trait BufferAccessor {
    /// Copy up to `length` bytes starting at `offset` out of the buffer `kind`
    fn read(
        &self,
        kind: BufferType,
        offset: usize,
        length: usize,
    ) -> Result<BufferSnapshot, FilterError>;

    /// Replace `length` bytes at `offset` with nothing
    fn drain(&mut self, kind: BufferType, offset: usize, length: usize)
        -> Result<(), FilterError>;
}

/// Buffer access through the proxy-wasm host calls
#[derive(Debug, Default, Clone, Copy)]
pub struct HostBuffer;

impl BufferAccessor for HostBuffer {
    fn read(
        &self,
        kind: BufferType,
        offset: usize,
        length: usize,
    ) -> Result<BufferSnapshot, FilterError> {
        snapshot_from_host(hostcalls::get_buffer(kind, offset, length), length)
    }

    fn drain(
        &mut self,
        kind: BufferType,
        offset: usize,
        length: usize,
    ) -> Result<(), FilterError> {
        hostcalls::set_buffer(kind, offset, length, &[])
            .map_err(|status| FilterError::BufferWriteError { length, status })
    }
}

/// Interpret the host's answer to a buffer read of `length` bytes.
///
/// The host hands back no data at all for an empty region, so a missing
/// result only counts as a failure when bytes were expected.
pub fn snapshot_from_host(
    result: Result<Option<Bytes>, Status>,
    length: usize,
) -> Result<BufferSnapshot, FilterError> {
    match result {
        Ok(Some(bytes)) => Ok(BufferSnapshot::new(bytes)),
        Ok(None) if length == 0 => Ok(BufferSnapshot::default()),
        Ok(None) => Err(FilterError::BufferUnavailable {
            length,
            status: None,
        }),
        Err(status) => Err(FilterError::BufferUnavailable {
            length,
            status: Some(status),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_with_data() {
        let snapshot = snapshot_from_host(Ok(Some(b"hello".to_vec())), 5).unwrap();
        assert_eq!(snapshot.as_bytes(), b"hello");
        assert_eq!(snapshot.len(), 5);
    }

    #[test]
    fn test_empty_region_without_data() {
        let snapshot = snapshot_from_host(Ok(None), 0).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_missing_data_is_unavailable() {
        let err = snapshot_from_host(Ok(None), 3).unwrap_err();
        assert_eq!(
            err,
            FilterError::BufferUnavailable {
                length: 3,
                status: None
            }
        );
    }

    #[test]
    fn test_host_error_is_unavailable() {
        let err = snapshot_from_host(Err(Status::NotFound), 0).unwrap_err();
        assert_eq!(
            err,
            FilterError::BufferUnavailable {
                length: 0,
                status: Some(Status::NotFound)
            }
        );
    }
}
