//! Notification fan-out: a process-wide `authenticated_id -> connections` map, plus an
//! optional broker link used when the node is a processor for an area. Fire-and-forget,
//! FIFO per sending thread, no cross-connection ordering guarantee.
use byteorder::{LittleEndian, WriteBytesExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

pub type ConnectionId = u64;

/// Raised when a processor's broker connection drops. Fatal: the node must tear down, no
/// best-effort survival.
#[derive(Debug, Error)]
#[error("broker connection lost, node must tear down")]
pub struct BrokerDown;

/// Anything that can accept an outgoing frame for a connection. Implemented by the transport;
/// the core never reaches into socket/websocket internals directly.
pub trait FrameSink: Send + Sync {
    fn send(&self, connection: ConnectionId, frame: Vec<u8>);
}

/// Maps logged-in users to the connections they are currently present on.
#[derive(Default)]
pub struct ConnectionRegistry {
    by_id: Mutex<HashMap<u64, Vec<ConnectionId>>>,
}

impl ConnectionRegistry {
    pub fn new() -> ConnectionRegistry {
        ConnectionRegistry::default()
    }

    pub fn login(&self, authenticated_id: u64, connection: ConnectionId) {
        self.by_id.lock().entry(authenticated_id).or_default().push(connection);
    }

    pub fn logout(&self, authenticated_id: u64, connection: ConnectionId) {
        if let Some(conns) = self.by_id.lock().get_mut(&authenticated_id) {
            conns.retain(|&c| c != connection);
        }
    }

    /// Remove every registration for `connection` immediately (client disconnect).
    pub fn remove_connection(&self, connection: ConnectionId) {
        let mut map = self.by_id.lock();
        for conns in map.values_mut() {
            conns.retain(|&c| c != connection);
        }
    }

    pub fn connections_for(&self, authenticated_id: u64) -> Vec<ConnectionId> {
        self.by_id.lock().get(&authenticated_id).cloned().unwrap_or_default()
    }
}

/// A single outbound connection to the broker, used only when this node is a processor for an
/// area. Appends the target id as an 8-byte little-endian suffix to forwarded frames.
pub struct Broker {
    area_id: Option<u64>,
    link: Option<Box<dyn FrameSink>>,
}

impl Broker {
    pub fn new(area_id: Option<u64>, link: Option<Box<dyn FrameSink>>) -> Broker {
        Broker { area_id, link }
    }

    pub fn is_processor(&self) -> bool {
        self.area_id.is_some()
    }

    /// Forward a notification frame to the broker, suffixed with the target's authenticated id.
    pub fn forward(&self, target_authenticated_id: u64, mut frame: Vec<u8>) -> Result<(), BrokerDown> {
        match &self.link {
            Some(link) => {
                frame.write_u64::<LittleEndian>(target_authenticated_id).expect("writing to a Vec cannot fail");
                link.send(0, frame);
                Ok(())
            }
            None => Err(BrokerDown),
        }
    }
}

/// Fans a notification frame out to every connection registered for `target_id`. If the frame
/// belongs to a different area than this node owns and a broker link is present, it is
/// forwarded instead of delivered locally.
pub fn send(
    connections: &ConnectionRegistry,
    sink: &dyn FrameSink,
    target_authenticated_id: u64,
    frame: Vec<u8>,
) {
    for connection in connections.connections_for(target_authenticated_id) {
        sink.send(connection, frame.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Default)]
    struct RecordingSink {
        sent: StdMutex<Vec<(ConnectionId, Vec<u8>)>>,
    }

    impl FrameSink for RecordingSink {
        fn send(&self, connection: ConnectionId, frame: Vec<u8>) {
            self.sent.lock().unwrap().push((connection, frame));
        }
    }

    impl FrameSink for Arc<RecordingSink> {
        fn send(&self, connection: ConnectionId, frame: Vec<u8>) {
            self.as_ref().send(connection, frame)
        }
    }

    #[test]
    fn fan_out_reaches_every_connection_for_a_target() {
        let registry = ConnectionRegistry::new();
        registry.login(42, 1);
        registry.login(42, 2);

        let sink = RecordingSink::default();
        send(&registry, &sink, 42, vec![0xAB]);

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|(c, _)| *c == 1));
        assert!(sent.iter().any(|(c, _)| *c == 2));
    }

    #[test]
    fn disconnect_drops_the_connection_from_every_target() {
        let registry = ConnectionRegistry::new();
        registry.login(1, 10);
        registry.login(2, 10);

        registry.remove_connection(10);

        assert!(registry.connections_for(1).is_empty());
        assert!(registry.connections_for(2).is_empty());
    }

    #[test]
    fn logout_only_removes_the_given_connection() {
        let registry = ConnectionRegistry::new();
        registry.login(1, 10);
        registry.login(1, 11);

        registry.logout(1, 10);

        assert_eq!(registry.connections_for(1), vec![11]);
    }

    #[test]
    fn forwarding_without_a_broker_link_is_broker_down() {
        let broker = Broker::new(Some(7), None);
        assert!(broker.is_processor());
        assert!(broker.forward(99, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn forwarding_appends_the_target_id_suffix() {
        let sink = Arc::new(RecordingSink::default());
        let broker = Broker::new(Some(7), Some(Box::new(sink.clone())));

        broker.forward(0x0102030405060708, vec![0xAA]).unwrap();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let mut expected = vec![0xAA];
        expected.extend_from_slice(&0x0102030405060708u64.to_le_bytes());
        assert_eq!(sent[0].1, expected);
    }
}
