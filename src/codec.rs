//! Request message for the foreign respond function
//!
//! The callee parses a protobuf message with a single `bytes data = 1`
//! field. Only encoding lives here; the response is raw bytes.

use prost::Message;

/// Arguments of the foreign respond call
#[derive(Clone, PartialEq, Message)]
pub struct RespondArguments {
    /// Exact bytes taken from the downstream buffer
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
}

impl RespondArguments {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Serialize to the length-delimited wire form handed to the callee
    pub fn encode_to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

/// Wrap `data` in a [`RespondArguments`] message and serialize it
pub fn encode(data: Vec<u8>) -> Vec<u8> {
    RespondArguments::new(data).encode_to_bytes()
}
