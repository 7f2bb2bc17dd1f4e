//! Worker loop: each worker thread owns a private `HandlerRegistry` (so its handler
//! instances are never touched by another thread) and a private database context, and
//! drains its own request channel in order.
use crate::handlers;
use crate::transport::{ConnectionTable, Job};
use arke_core::db::NullDbContext;
use arke_core::dispatch::dispatch_request;
use arke_core::notify::{self, ConnectionRegistry, FrameSink};
use arke_core::registry::HandlerRegistry;
use arke_core::response::ResponseCode;
use arke_support::AuthenticatedId;
use slog::Logger;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::frame;

pub fn run(
    jobs: Receiver<Job>,
    connections: Arc<ConnectionTable>,
    registry: Arc<ConnectionRegistry>,
    log: Logger,
) {
    let mut handler_registry = HandlerRegistry::new(1, handlers::registrations());
    let mut db = NullDbContext::default();

    for job in jobs {
        let mut authenticated_id = AuthenticatedId(job.authenticated_id.load(Ordering::Acquire));

        let outcome = dispatch_request(
            &mut handler_registry,
            0,
            &mut authenticated_id,
            job.category,
            job.method,
            &job.payload,
            &mut db,
            &log,
        );

        if let Some(new_id) = outcome.auth_transition {
            let old_id = AuthenticatedId(job.authenticated_id.swap(new_id.0, Ordering::AcqRel));
            if !old_id.is_authenticated() && new_id.is_authenticated() {
                registry.login(new_id.0, job.connection);
            } else if old_id.is_authenticated() && !new_id.is_authenticated() {
                registry.logout(old_id.0, job.connection);
            }
        }

        if outcome.code != ResponseCode::NO_RESPONSE {
            let mut frame = Vec::new();
            frame::write_response(&mut frame, outcome.code.0, outcome.payload.as_deref())
                .expect("writing to a Vec cannot fail");
            connections.send(job.connection, frame);
        }

        for n in outcome.notifications {
            let frame = notification_frame(n.notification_type, n.object_id);
            notify::send(&registry, connections.as_ref(), n.target_authenticated_id, frame);
        }
    }
}

fn notification_frame(notification_type: u64, object_id: u64) -> Vec<u8> {
    use byteorder::{LittleEndian, WriteBytesExt};
    let mut buf = Vec::with_capacity(16);
    buf.write_u64::<LittleEndian>(notification_type).expect("writing to a Vec cannot fail");
    buf.write_u64::<LittleEndian>(object_id).expect("writing to a Vec cannot fail");
    buf
}
