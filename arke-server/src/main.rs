mod frame;
mod handlers;
mod transport;
mod worker;

use anyhow::{Context, Result};
use arke_core::notify::ConnectionRegistry;
use arke_support::config::NodeConfig;
use std::net::TcpListener;
use std::sync::mpsc;
use std::sync::Arc;

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let config = match &config_path {
        Some(path) => NodeConfig::load(path).with_context(|| format!("loading config from {path}"))?,
        None => NodeConfig::default(),
    };

    let log = arke_support::logging::init(&config.logging);
    slog::info!(log, "starting node"; "tcp_address" => &config.server.tcp_address, "workers" => config.server.worker_count);

    let listener = TcpListener::bind(&config.server.tcp_address)
        .with_context(|| format!("binding {}", config.server.tcp_address))?;

    let connections = Arc::new(transport::ConnectionTable::new());
    let connection_registry = Arc::new(ConnectionRegistry::new());

    let mut worker_senders = Vec::with_capacity(config.server.worker_count);
    for worker_id in 0..config.server.worker_count {
        let (tx, rx) = mpsc::channel();
        worker_senders.push(tx);

        let connections = connections.clone();
        let connection_registry = connection_registry.clone();
        let worker_log = log.new(slog::o!("worker" => worker_id));
        std::thread::spawn(move || worker::run(rx, connections, connection_registry, worker_log));
    }
    let worker_senders = Arc::new(worker_senders);

    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(err) => {
                slog::warn!(log, "accept failed"; "error" => %err);
                continue;
            }
        };

        let connections = connections.clone();
        let worker_senders = worker_senders.clone();
        let conn_log = log.new(slog::o!());
        std::thread::spawn(move || transport::handle_connection(stream, connections, worker_senders, conn_log));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::handlers;
    use arke_core::db::NullDbContext;
    use arke_core::dispatch::dispatch_request;
    use arke_core::registry::HandlerRegistry;
    use arke_core::response::ResponseCode;
    use arke_support::AuthenticatedId;

    #[test]
    fn ping_request_round_trips_end_to_end() {
        let mut registry = HandlerRegistry::new(1, handlers::registrations());
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        let log = arke_support::logging::root_logger();

        let outcome = dispatch_request(&mut registry, 0, &mut auth, 1, 1, &[], &mut db, &log);

        assert_eq!(outcome.code, ResponseCode::SUCCESS);
        assert_eq!(outcome.payload, Some(Vec::new()));
        assert_eq!(db.commit_calls, 1);
    }

    #[test]
    fn echo_request_returns_what_it_was_sent() {
        let mut registry = HandlerRegistry::new(1, handlers::registrations());
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        let log = arke_support::logging::root_logger();

        let payload = vec![0x02, 0x00, b'H', b'i'];
        let outcome = dispatch_request(&mut registry, 0, &mut auth, 2, 1, &payload, &mut db, &log);

        assert_eq!(outcome.code, ResponseCode::SUCCESS);
        assert_eq!(outcome.payload, Some(vec![0x02, 0x00, b'H', b'i']));
    }

    #[test]
    fn sync_conflict_retries_then_succeeds_with_exactly_one_rollback() {
        let mut registry = HandlerRegistry::new(1, handlers::registrations());
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        let log = arke_support::logging::root_logger();

        let first = dispatch_request(&mut registry, 0, &mut auth, 4, 1, &[], &mut db, &log);
        assert_eq!(first.code, ResponseCode::RETRY_LATER);
        assert!(first.notifications.is_empty());
        assert_eq!(db.rollback_calls, 1);
        assert_eq!(db.commit_calls, 0);

        let second = dispatch_request(&mut registry, 0, &mut auth, 4, 1, &[], &mut db, &log);
        assert_eq!(second.code, ResponseCode::SUCCESS);
        assert_eq!(db.commit_calls, 1);
    }

    #[test]
    fn unknown_category_method_is_invalid_request_type() {
        let mut registry = HandlerRegistry::new(1, handlers::registrations());
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        let log = arke_support::logging::root_logger();

        let outcome = dispatch_request(&mut registry, 0, &mut auth, 99, 99, &[], &mut db, &log);

        assert_eq!(outcome.code, ResponseCode::INVALID_REQUEST_TYPE);
        assert_eq!(db.commit_calls, 0);
        assert_eq!(db.rollback_calls, 0);
    }

    #[test]
    fn login_then_logout_through_dispatch_flips_the_authenticated_id() {
        let mut registry = HandlerRegistry::new(1, handlers::registrations());
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        let log = arke_support::logging::root_logger();

        let mut login_payload = Vec::new();
        arke_core::wire::WireCodec::write(&mut 7u64, &mut login_payload).unwrap();
        let login_outcome = dispatch_request(&mut registry, 0, &mut auth, 5, 1, &login_payload, &mut db, &log);
        assert_eq!(login_outcome.code, ResponseCode::SUCCESS);
        assert_eq!(auth, AuthenticatedId(7));
        assert_eq!(login_outcome.auth_transition, Some(AuthenticatedId(7)));

        let logout_outcome = dispatch_request(&mut registry, 0, &mut auth, 5, 2, &[], &mut db, &log);
        assert_eq!(logout_outcome.code, ResponseCode::SUCCESS);
        assert_eq!(auth, AuthenticatedId::UNAUTHENTICATED);
    }
}
