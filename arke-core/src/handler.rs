//! Handler instances: stateful objects bound to a `(category, method)` key, reused across
//! requests on the worker that owns them.
use crate::db::{DbContext, DbError};
use crate::response::ResponseCode;
use crate::wire::WireError;
use arke_support::AuthenticatedId;
use std::io::{Read, Write};

/// Produced by handlers, drained by the notification fan-out stage after a successful commit.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Notification {
    pub target_authenticated_id: u64,
    pub notification_type: u64,
    pub object_id: u64,
}

/// Hand-written business logic for one handler. `#[derive(Handler)]` supplies the codec
/// plumbing (`deserialize`/`serialize`) around this and wires both into the `Handler` trait
/// object the registry and dispatch loop operate on.
pub trait HandlerLogic {
    /// Response code 0 (`SUCCESS`) on passing validation.
    fn is_valid(&self) -> ResponseCode {
        ResponseCode::SUCCESS
    }

    /// Runs the request against the worker's database context. `authenticated_id` is mutable so
    /// a login/logout handler can change it; dispatch step 9 observes the delta.
    fn process(
        &mut self,
        db: &mut dyn DbContext,
        authenticated_id: &mut AuthenticatedId,
    ) -> Result<ResponseCode, DbError>;

    /// Pending notifications produced by the last `process` call.
    fn outbox(&mut self) -> &mut Vec<Notification>;
}

/// The trait-object boundary the registry and dispatch loop operate on. Generated for every
/// `#[derive(Handler)]` type.
pub trait Handler: Send {
    fn deserialize_input(&mut self, r: &mut dyn Read) -> Result<(), WireError>;
    fn serialize_output(&mut self, w: &mut dyn Write) -> Result<(), WireError>;
    fn is_valid(&self) -> ResponseCode;
    fn process(
        &mut self,
        db: &mut dyn DbContext,
        authenticated_id: &mut AuthenticatedId,
    ) -> Result<ResponseCode, DbError>;
    fn drain_notifications(&mut self) -> Vec<Notification>;
    fn category(&self) -> u8;
    fn method(&self) -> u8;
    fn required_auth_level(&self) -> u8;
}
