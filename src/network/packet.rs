use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::error::{check_packet_size, protocol_error, unknown_kind, NetworkResult};
use super::protocol::{MSG_LEVEL_REQUEST, MSG_LEVEL_RESPONSE, MSG_LEVEL_UPDATE};
use crate::world::RegionBlock;

/// "Send me the region blocks relevant near this point"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSyncRequest {
    pub observer_position: Vec3,
    pub view_radius: f32,
}

/// One region block, pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSyncResponse {
    pub region_block: RegionBlock,
}

/// Request to add content at a ground-plane coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockMutation {
    pub x: f32,
    pub z: f32,
}

/// Closed set of message kinds handled by this protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    LevelRequest,
    LevelResponse,
    LevelUpdate,
}

impl MessageKind {
    pub fn id(self) -> u16 {
        match self {
            MessageKind::LevelRequest => MSG_LEVEL_REQUEST,
            MessageKind::LevelResponse => MSG_LEVEL_RESPONSE,
            MessageKind::LevelUpdate => MSG_LEVEL_UPDATE,
        }
    }

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            MSG_LEVEL_REQUEST => Some(MessageKind::LevelRequest),
            MSG_LEVEL_RESPONSE => Some(MessageKind::LevelResponse),
            MSG_LEVEL_UPDATE => Some(MessageKind::LevelUpdate),
            _ => None,
        }
    }
}

/// Typed protocol message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    LevelRequest(LevelSyncRequest),
    LevelResponse(LevelSyncResponse),
    LevelUpdate(BlockMutation),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::LevelRequest(_) => MessageKind::LevelRequest,
            Message::LevelResponse(_) => MessageKind::LevelResponse,
            Message::LevelUpdate(_) => MessageKind::LevelUpdate,
        }
    }
}

/// Wire frame: a kind id plus a bincode payload.
///
/// The kind stays a raw id so frames of kinds this build does not know can
/// still be received, reported and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub kind: u16,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Encode a message, rejecting payloads above `max_size`
    pub fn encode(message: &Message, max_size: usize) -> NetworkResult<Self> {
        let payload = match message {
            Message::LevelRequest(request) => bincode::serialize(request)?,
            Message::LevelResponse(response) => bincode::serialize(response)?,
            Message::LevelUpdate(mutation) => bincode::serialize(mutation)?,
        };
        check_packet_size(payload.len(), max_size)?;

        Ok(Self {
            kind: message.kind().id(),
            payload,
        })
    }

    /// Decode the payload according to the frame's kind
    pub fn decode(&self, max_size: usize) -> NetworkResult<Message> {
        check_packet_size(self.payload.len(), max_size)?;

        let kind = self.message_kind().ok_or_else(|| unknown_kind(self.kind))?;
        let message = match kind {
            MessageKind::LevelRequest => Message::LevelRequest(bincode::deserialize(&self.payload)?),
            MessageKind::LevelResponse => Message::LevelResponse(bincode::deserialize(&self.payload)?),
            MessageKind::LevelUpdate => Message::LevelUpdate(bincode::deserialize(&self.payload)?),
        };

        match &message {
            Message::LevelRequest(request) => {
                if !request.view_radius.is_finite() || request.view_radius <= 0.0 {
                    return Err(protocol_error(format!(
                        "level request with invalid view radius {}",
                        request.view_radius
                    )));
                }
                if !request.observer_position.is_finite() {
                    return Err(protocol_error(format!(
                        "level request from non-finite position {:?}",
                        request.observer_position
                    )));
                }
            }
            Message::LevelResponse(response) => {
                let extent = response.region_block.extent();
                if !extent.is_valid() {
                    return Err(protocol_error(format!(
                        "level response with empty extent {:?}",
                        extent
                    )));
                }
            }
            Message::LevelUpdate(_) => {}
        }

        Ok(message)
    }

    pub fn message_kind(&self) -> Option<MessageKind> {
        MessageKind::from_id(self.kind)
    }

    /// Serialize the whole frame to bytes
    pub fn to_bytes(&self) -> NetworkResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a whole frame from bytes
    pub fn from_bytes(bytes: &[u8]) -> NetworkResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
