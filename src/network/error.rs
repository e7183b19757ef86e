//! Network-specific error helpers

use crate::error::{StreamError, StreamResult};

/// Type alias for network-specific results
pub type NetworkResult<T> = StreamResult<T>;

/// Create a protocol error
pub fn protocol_error(message: impl Into<String>) -> StreamError {
    StreamError::ProtocolError {
        message: message.into(),
    }
}

/// Create an unknown message kind error
pub fn unknown_kind(id: u16) -> StreamError {
    StreamError::UnknownMessageKind { id }
}

/// Reject frames larger than `max_size`
pub fn check_packet_size(size: usize, max_size: usize) -> NetworkResult<()> {
    if size > max_size {
        return Err(StreamError::PacketTooLarge { size, max_size });
    }
    Ok(())
}
