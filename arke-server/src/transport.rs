//! The TCP transport: one reader and one writer thread per connection, plus a shared
//! connection table used both for ordinary responses and for notification fan-out.
use crate::frame;
use arke_core::notify::{ConnectionId, FrameSink};
use parking_lot::Mutex;
use slog::Logger;
use std::collections::HashMap;
use std::io::{BufReader, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

/// One request, tagged with the connection it arrived on and that connection's current
/// authenticated id (shared so the worker can observe a login/logout made by an earlier
/// request on the same connection).
pub struct Job {
    pub connection: ConnectionId,
    pub authenticated_id: Arc<AtomicU64>,
    pub category: u8,
    pub method: u8,
    pub payload: Vec<u8>,
}

/// `connection id -> outbound frame sender`, shared by every worker for ordinary responses
/// and by the notification fan-out stage.
#[derive(Default)]
pub struct ConnectionTable {
    writers: Mutex<HashMap<ConnectionId, Sender<Vec<u8>>>>,
}

impl ConnectionTable {
    pub fn new() -> ConnectionTable {
        ConnectionTable::default()
    }

    pub fn insert(&self, connection: ConnectionId, writer: Sender<Vec<u8>>) {
        self.writers.lock().insert(connection, writer);
    }

    pub fn remove(&self, connection: ConnectionId) {
        self.writers.lock().remove(&connection);
    }
}

impl FrameSink for ConnectionTable {
    fn send(&self, connection: ConnectionId, frame: Vec<u8>) {
        if let Some(writer) = self.writers.lock().get(&connection) {
            let _ = writer.send(frame);
        }
    }
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Spawns the writer thread and reader loop for one accepted connection. Requests are handed
/// off to `workers[connection_id % workers.len()]`, so every request from this connection is
/// processed by the same worker and responses keep request order.
pub fn handle_connection(
    stream: TcpStream,
    connections: Arc<ConnectionTable>,
    workers: Arc<Vec<Sender<Job>>>,
    log: Logger,
) {
    let connection_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    let worker = workers[connection_id as usize % workers.len()].clone();

    let (write_tx, write_rx) = mpsc::channel::<Vec<u8>>();
    connections.insert(connection_id, write_tx);

    let mut writer_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            slog::warn!(log, "failed to clone connection"; "error" => %err);
            connections.remove(connection_id);
            return;
        }
    };
    let writer_log = log.clone();
    std::thread::spawn(move || {
        for frame in write_rx {
            if let Err(err) = writer_stream.write_all(&frame) {
                slog::debug!(writer_log, "write failed, dropping connection"; "error" => %err);
                break;
            }
        }
    });

    let authenticated_id = Arc::new(AtomicU64::new(0));
    let mut reader = BufReader::new(stream);

    while let Ok(request) = frame::read_request(&mut reader) {
        let job = Job {
            connection: connection_id,
            authenticated_id: authenticated_id.clone(),
            category: request.category,
            method: request.method,
            payload: request.payload,
        };

        if worker.send(job).is_err() {
            break;
        }
    }

    connections.remove(connection_id);
}
