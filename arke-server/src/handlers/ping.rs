use arke_core::db::{DbContext, DbError};
use arke_core::handler::{HandlerLogic, Notification};
use arke_core::response::ResponseCode;
use arke_macros::Handler;
use arke_support::AuthenticatedId;

/// No parameters, always succeeds. Used to exercise the bare dispatch path.
#[derive(Default, Handler)]
#[handler(category = 1, method = 1)]
pub struct Ping {
    outbox: Vec<Notification>,
}

impl HandlerLogic for Ping {
    fn process(
        &mut self,
        _db: &mut dyn DbContext,
        _authenticated_id: &mut AuthenticatedId,
    ) -> Result<ResponseCode, DbError> {
        Ok(ResponseCode::SUCCESS)
    }

    fn outbox(&mut self) -> &mut Vec<Notification> {
        &mut self.outbox
    }
}
