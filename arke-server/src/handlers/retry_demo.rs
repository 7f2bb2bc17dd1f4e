use arke_core::db::{DbContext, DbError};
use arke_core::handler::{HandlerLogic, Notification};
use arke_core::response::ResponseCode;
use arke_macros::Handler;
use arke_support::AuthenticatedId;

/// Raises a synchronization conflict on its first call per instance, then succeeds. Exercises
/// the rollback-and-retry path of the dispatch loop.
#[derive(Default, Handler)]
#[handler(category = 4, method = 1)]
pub struct RetryDemo {
    attempted: bool,
    outbox: Vec<Notification>,
}

impl HandlerLogic for RetryDemo {
    fn process(
        &mut self,
        _db: &mut dyn DbContext,
        _authenticated_id: &mut AuthenticatedId,
    ) -> Result<ResponseCode, DbError> {
        if !self.attempted {
            self.attempted = true;
            return Err(DbError::SyncConflict);
        }
        Ok(ResponseCode::SUCCESS)
    }

    fn outbox(&mut self) -> &mut Vec<Notification> {
        &mut self.outbox
    }
}
