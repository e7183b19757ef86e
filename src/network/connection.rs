use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::error::NetworkResult;
use super::packet::{Message, Packet};
use crate::error::StreamError;

/// Outbound transport. Sends are fire-and-forget: `Ok` means the message
/// was handed to the transport, not that it arrived.
pub trait Connection {
    fn is_connected(&self) -> bool;

    fn send(&self, message: Message) -> NetworkResult<()>;
}

impl<C: Connection + ?Sized> Connection for Rc<C> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(&self, message: Message) -> NetworkResult<()> {
        (**self).send(message)
    }
}

impl<C: Connection + ?Sized> Connection for &C {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(&self, message: Message) -> NetworkResult<()> {
        (**self).send(message)
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Connection statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub dropped_while_disconnected: u64,
}

/// In-memory transport that encodes outgoing messages into frames and
/// queues them until the other side drains them.
///
/// Single-threaded; share it between clients with `Rc`.
#[derive(Debug)]
pub struct QueuedConnection {
    state: Cell<ConnectionState>,
    send_queue: RefCell<VecDeque<Packet>>,
    stats: Cell<ConnectionStats>,
    max_packet_size: usize,
}

impl QueuedConnection {
    /// A connected transport
    pub fn new(max_packet_size: usize) -> Self {
        Self {
            state: Cell::new(ConnectionState::Connected),
            send_queue: RefCell::new(VecDeque::new()),
            stats: Cell::new(ConnectionStats::default()),
            max_packet_size,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.state.set(state);
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats.get()
    }

    /// Number of frames waiting to be drained
    pub fn pending(&self) -> usize {
        self.send_queue.borrow().len()
    }

    /// Take every queued frame, oldest first
    pub fn drain_outgoing(&self) -> Vec<Packet> {
        self.send_queue.borrow_mut().drain(..).collect()
    }

    /// Inject an already encoded frame, bypassing the codec
    pub fn push_raw(&self, packet: Packet) {
        self.send_queue.borrow_mut().push_back(packet);
    }
}

impl Connection for QueuedConnection {
    fn is_connected(&self) -> bool {
        self.state.get() == ConnectionState::Connected
    }

    fn send(&self, message: Message) -> NetworkResult<()> {
        let mut stats = self.stats.get();

        if !self.is_connected() {
            stats.dropped_while_disconnected += 1;
            self.stats.set(stats);
            return Err(StreamError::Disconnected);
        }

        let packet = Packet::encode(&message, self.max_packet_size)?;
        stats.packets_sent += 1;
        stats.bytes_sent += packet.payload.len() as u64;
        self.stats.set(stats);

        self.send_queue.borrow_mut().push_back(packet);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::packet::{BlockMutation, MessageKind};
    use crate::network::protocol::MAX_PACKET_SIZE;

    #[test]
    fn test_send_queues_encoded_frames() {
        let connection = QueuedConnection::new(MAX_PACKET_SIZE);
        connection
            .send(Message::LevelUpdate(BlockMutation { x: 1.0, z: 2.0 }))
            .unwrap();
        connection
            .send(Message::LevelUpdate(BlockMutation { x: 3.0, z: 4.0 }))
            .unwrap();

        assert_eq!(connection.pending(), 2);
        assert_eq!(connection.stats().packets_sent, 2);

        let frames = connection.drain_outgoing();
        assert_eq!(frames[0].message_kind(), Some(MessageKind::LevelUpdate));
        assert_eq!(
            frames[1].decode(MAX_PACKET_SIZE).unwrap(),
            Message::LevelUpdate(BlockMutation { x: 3.0, z: 4.0 })
        );
        assert_eq!(connection.pending(), 0);
    }

    #[test]
    fn test_disconnected_send_is_dropped() {
        let connection = QueuedConnection::new(MAX_PACKET_SIZE);
        connection.set_state(ConnectionState::Disconnected);

        let result = connection.send(Message::LevelUpdate(BlockMutation { x: 0.0, z: 0.0 }));
        assert!(matches!(result, Err(StreamError::Disconnected)));
        assert_eq!(connection.pending(), 0);
        assert_eq!(connection.stats().dropped_while_disconnected, 1);
    }

    #[test]
    fn test_shared_handle_sends_through() {
        let connection = Rc::new(QueuedConnection::new(MAX_PACKET_SIZE));
        let shared = Rc::clone(&connection);
        assert!(shared.is_connected());

        shared
            .send(Message::LevelUpdate(BlockMutation { x: 0.0, z: 0.0 }))
            .unwrap();
        assert_eq!(connection.pending(), 1);
    }
}
