//! The per-request dispatch sequence: resolve, deserialize, validate, transact, respond.
use crate::db::{DbContext, DbError};
use crate::handler::Notification;
use crate::registry::HandlerRegistry;
use crate::response::ResponseCode;
use crate::wire::WireError;
use arke_support::AuthenticatedId;
use slog::Logger;
use std::io::Cursor;

/// The outcome of dispatching one request frame. `payload` is only populated on success.
/// `ResponseCode::NO_RESPONSE` callers must suppress the reply frame entirely.
pub struct DispatchOutcome {
    pub code: ResponseCode,
    pub payload: Option<Vec<u8>>,
    pub notifications: Vec<Notification>,
    /// `Some(new_id)` when the handler changed `authenticated_id` from its starting value
    /// (login when old was zero, logout when new is zero).
    pub auth_transition: Option<AuthenticatedId>,
}

/// Runs one request through steps 1-10 of the dispatch sequence. `authenticated_id` reflects
/// the connection's state both in and out (the caller applies the login/logout side effect).
pub fn dispatch_request(
    registry: &mut HandlerRegistry,
    worker: usize,
    authenticated_id: &mut AuthenticatedId,
    category: u8,
    method: u8,
    payload: &[u8],
    db: &mut dyn DbContext,
    log: &Logger,
) -> DispatchOutcome {
    let starting_auth = *authenticated_id;

    let handler = match registry.resolve(worker, starting_auth.is_authenticated(), category, method) {
        Ok(handler) => handler,
        Err(code) => {
            slog::debug!(log, "no handler for request"; "category" => category, "method" => method);
            return no_op_outcome(code);
        }
    };

    let mut cursor = Cursor::new(payload);
    if let Err(err) = handler.deserialize_input(&mut cursor) {
        slog::debug!(log, "short or malformed payload"; "category" => category, "method" => method, "error" => %err);
        return no_op_outcome(deserialize_failure_code(err));
    }

    let valid = handler.is_valid();
    if !valid.is_success() {
        slog::debug!(log, "validation failed"; "category" => category, "method" => method, "code" => valid.0);
        return no_op_outcome(valid);
    }

    if let Err(err) = db.begin_transaction() {
        slog::warn!(log, "begin_transaction failed"; "error" => %err);
        return no_op_outcome(ResponseCode::SERVER_ERROR);
    }

    let mut working_auth = starting_auth;
    let process_result = handler.process(db, &mut working_auth);

    let (code, notifications) = match process_result {
        Ok(code) if code.is_success() => match db.commit_transaction() {
            Ok(()) => (code, handler.drain_notifications()),
            Err(_) => {
                let _ = db.rollback_transaction();
                let _ = handler.drain_notifications();
                slog::warn!(log, "commit failed, rolled back"; "category" => category, "method" => method);
                (ResponseCode::SERVER_ERROR, Vec::new())
            }
        },
        Ok(code) => {
            let _ = db.rollback_transaction();
            let _ = handler.drain_notifications();
            slog::debug!(log, "handler returned a non-success code, rolled back"; "category" => category, "method" => method, "code" => code.0);
            (code, Vec::new())
        }
        Err(DbError::SyncConflict) => {
            let _ = db.rollback_transaction();
            let _ = handler.drain_notifications();
            slog::debug!(log, "synchronization conflict, retrying later"; "category" => category, "method" => method);
            (ResponseCode::RETRY_LATER, Vec::new())
        }
        Err(DbError::Other(reason)) => {
            let _ = db.rollback_transaction();
            let _ = handler.drain_notifications();
            slog::warn!(log, "process failed"; "category" => category, "method" => method, "reason" => reason);
            (ResponseCode::SERVER_ERROR, Vec::new())
        }
    };

    let payload = if code.is_success() {
        let mut buf = Vec::new();
        match handler.serialize_output(&mut buf) {
            Ok(()) => Some(buf),
            Err(_) => return no_op_outcome(ResponseCode::SERVER_ERROR),
        }
    } else {
        None
    };

    let auth_transition = if code.is_success() && working_auth != starting_auth {
        *authenticated_id = working_auth;
        Some(working_auth)
    } else {
        None
    };

    DispatchOutcome {
        code,
        payload,
        notifications,
        auth_transition,
    }
}

fn deserialize_failure_code(_err: WireError) -> ResponseCode {
    ResponseCode::INVALID_PARAMETERS
}

fn no_op_outcome(code: ResponseCode) -> DispatchOutcome {
    DispatchOutcome {
        code,
        payload: None,
        notifications: Vec::new(),
        auth_transition: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NullDbContext;
    use crate::registry::Registration;

    #[test]
    fn unknown_method_yields_invalid_request_type_with_no_side_effects() {
        let mut registry = HandlerRegistry::new(1, Vec::new());
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        let log = arke_support::logging::root_logger();

        let outcome = dispatch_request(&mut registry, 0, &mut auth, 9, 9, &[], &mut db, &log);

        assert_eq!(outcome.code, ResponseCode::INVALID_REQUEST_TYPE);
        assert!(outcome.payload.is_none());
        assert!(outcome.notifications.is_empty());
        assert_eq!(db.commit_calls, 0);
        assert_eq!(db.rollback_calls, 0);
    }

    struct DomainError;

    impl crate::handler::Handler for DomainError {
        fn deserialize_input(&mut self, _r: &mut dyn std::io::Read) -> Result<(), WireError> {
            Ok(())
        }
        fn serialize_output(&mut self, _w: &mut dyn std::io::Write) -> Result<(), WireError> {
            Ok(())
        }
        fn is_valid(&self) -> ResponseCode {
            ResponseCode::SUCCESS
        }
        fn process(
            &mut self,
            _db: &mut dyn DbContext,
            _auth: &mut AuthenticatedId,
        ) -> Result<ResponseCode, DbError> {
            Ok(ResponseCode::INVALID_PARAMETERS)
        }
        fn drain_notifications(&mut self) -> Vec<crate::handler::Notification> {
            vec![crate::handler::Notification {
                target_authenticated_id: 1,
                notification_type: 1,
                object_id: 1,
            }]
        }
        fn category(&self) -> u8 {
            2
        }
        fn method(&self) -> u8 {
            1
        }
        fn required_auth_level(&self) -> u8 {
            0
        }
    }

    #[test]
    fn a_handler_defined_domain_error_rolls_back_instead_of_committing() {
        let mut registry = HandlerRegistry::new(
            1,
            vec![Registration {
                key: 0x0201,
                required_auth_level: 0,
                authenticated: false,
                make: || Box::new(DomainError),
            }],
        );
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        let log = arke_support::logging::root_logger();

        let outcome = dispatch_request(&mut registry, 0, &mut auth, 2, 1, &[], &mut db, &log);

        assert_eq!(outcome.code, ResponseCode::INVALID_PARAMETERS);
        assert!(outcome.payload.is_none());
        assert!(outcome.notifications.is_empty());
        assert_eq!(db.commit_calls, 0);
        assert_eq!(db.rollback_calls, 1);
    }

    struct AlwaysSuccess;

    impl crate::handler::Handler for AlwaysSuccess {
        fn deserialize_input(&mut self, _r: &mut dyn std::io::Read) -> Result<(), WireError> {
            Ok(())
        }
        fn serialize_output(&mut self, _w: &mut dyn std::io::Write) -> Result<(), WireError> {
            Ok(())
        }
        fn is_valid(&self) -> ResponseCode {
            ResponseCode::SUCCESS
        }
        fn process(
            &mut self,
            _db: &mut dyn DbContext,
            _auth: &mut AuthenticatedId,
        ) -> Result<ResponseCode, DbError> {
            Ok(ResponseCode::SUCCESS)
        }
        fn drain_notifications(&mut self) -> Vec<crate::handler::Notification> {
            vec![crate::handler::Notification {
                target_authenticated_id: 1,
                notification_type: 1,
                object_id: 1,
            }]
        }
        fn category(&self) -> u8 {
            3
        }
        fn method(&self) -> u8 {
            1
        }
        fn required_auth_level(&self) -> u8 {
            0
        }
    }

    #[test]
    fn commit_failure_rolls_back_and_reports_server_error_with_no_notifications() {
        let mut registry = HandlerRegistry::new(
            1,
            vec![Registration {
                key: 0x0301,
                required_auth_level: 0,
                authenticated: false,
                make: || Box::new(AlwaysSuccess),
            }],
        );
        let mut db = NullDbContext {
            fail_next_commit: Some(DbError::Other("disk full".to_string())),
            ..Default::default()
        };
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        let log = arke_support::logging::root_logger();

        let outcome = dispatch_request(&mut registry, 0, &mut auth, 3, 1, &[], &mut db, &log);

        assert_eq!(outcome.code, ResponseCode::SERVER_ERROR);
        assert!(outcome.payload.is_none());
        assert!(outcome.notifications.is_empty());
        assert_eq!(db.commit_calls, 1);
        assert_eq!(db.rollback_calls, 1);
    }

    // Full end-to-end dispatch (short payload / retry) is exercised against concrete demo
    // handlers in the `arke-server` crate, where `#[derive(Handler)]` types actually exist.
    #[test]
    fn empty_registry_has_no_registrations() {
        let registry = HandlerRegistry::new(4, Vec::new());
        assert_eq!(registry.worker_count(), 4);
        let _ = Registration::of::<NeverUsed>(false, || unreachable!());
    }

    struct NeverUsed;
    impl crate::schema::HandlerSchema for NeverUsed {
        const CATEGORY: u8 = 0;
        const METHOD: u8 = 0;
        const REQUIRED_AUTH_LEVEL: u8 = 0;
        const INPUT: &'static [crate::schema::ParamNode] = &[];
        const OUTPUT: &'static [crate::schema::ParamNode] = &[];
    }
}
