use arke_core::db::{DbContext, DbError};
use arke_core::handler::{HandlerLogic, Notification};
use arke_core::response::ResponseCode;
use arke_macros::Handler;
use arke_support::AuthenticatedId;

/// Unauthenticated handler that assigns the connection's identity from a demo credential.
#[derive(Default, Handler)]
#[handler(category = 5, method = 1)]
pub struct Login {
    #[param(index = 0, dir = "in")]
    user_id: u64,
    outbox: Vec<Notification>,
}

impl HandlerLogic for Login {
    fn process(
        &mut self,
        _db: &mut dyn DbContext,
        authenticated_id: &mut AuthenticatedId,
    ) -> Result<ResponseCode, DbError> {
        *authenticated_id = AuthenticatedId(self.user_id);
        Ok(ResponseCode::SUCCESS)
    }

    fn outbox(&mut self) -> &mut Vec<Notification> {
        &mut self.outbox
    }
}

/// Authenticated handler that clears the connection's identity.
#[derive(Default, Handler)]
#[handler(category = 5, method = 2, auth_level = 1)]
pub struct Logout {
    outbox: Vec<Notification>,
}

impl HandlerLogic for Logout {
    fn process(
        &mut self,
        _db: &mut dyn DbContext,
        authenticated_id: &mut AuthenticatedId,
    ) -> Result<ResponseCode, DbError> {
        *authenticated_id = AuthenticatedId::UNAUTHENTICATED;
        Ok(ResponseCode::SUCCESS)
    }

    fn outbox(&mut self) -> &mut Vec<Notification> {
        &mut self.outbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arke_core::db::NullDbContext;

    #[test]
    fn login_sets_the_authenticated_id() {
        let mut login = Login {
            user_id: 42,
            outbox: Vec::new(),
        };
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;

        login.process(&mut db, &mut auth).unwrap();
        assert_eq!(auth, AuthenticatedId(42));
    }

    #[test]
    fn logout_clears_the_authenticated_id() {
        let mut logout = Logout::default();
        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId(42);

        logout.process(&mut db, &mut auth).unwrap();
        assert_eq!(auth, AuthenticatedId::UNAUTHENTICATED);
    }
}
