use arke_core::db::{DbContext, DbError};
use arke_core::handler::{HandlerLogic, Notification};
use arke_core::response::ResponseCode;
use arke_macros::Handler;
use arke_support::AuthenticatedId;

/// Copies its string input straight to its string output.
#[derive(Default, Handler)]
#[handler(category = 2, method = 1)]
pub struct Echo {
    #[param(index = 0, dir = "in")]
    msg_in: String,
    #[param(index = 0, dir = "out")]
    msg_out: String,
    outbox: Vec<Notification>,
}

impl HandlerLogic for Echo {
    fn process(
        &mut self,
        _db: &mut dyn DbContext,
        _authenticated_id: &mut AuthenticatedId,
    ) -> Result<ResponseCode, DbError> {
        self.msg_out = self.msg_in.clone();
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
    use arke_core::handler::Handler;
    use arke_core::wire::WireCodec;
    use std::io::Cursor;

    #[test]
    fn echo_returns_the_string_it_was_given() {
        let mut echo = Echo::default();

        let mut payload = Vec::new();
        let mut msg = "Hi".to_string();
        msg.write(&mut payload).unwrap();
        Handler::deserialize_input(&mut echo, &mut Cursor::new(payload)).unwrap();

        let mut db = NullDbContext::default();
        let mut auth = AuthenticatedId::UNAUTHENTICATED;
        assert_eq!(HandlerLogic::process(&mut echo, &mut db, &mut auth).unwrap(), ResponseCode::SUCCESS);

        let mut out = Vec::new();
        echo.serialize_output(&mut out).unwrap();
        assert_eq!(out, vec![0x02, 0x00, b'H', b'i']);
    }
}
