use arke_core::db::{DbContext, DbError};
use arke_core::handler::{HandlerLogic, Notification};
use arke_core::paged::{paged_list, FieldSorters};
use arke_core::response::ResponseCode;
use arke_macros::{Handler, WireCodec};
use arke_support::AuthenticatedId;

#[derive(Default, Clone, WireCodec)]
pub struct Entry {
    #[field(index = 0)]
    pub id: u64,
    #[field(index = 1)]
    pub name: String,
}

struct Row {
    id: u64,
    name: String,
}

fn demo_rows() -> Vec<Row> {
    (0..5)
        .map(|i| Row {
            id: i,
            name: format!("player-{i}"),
        })
        .collect()
}

fn sorters() -> FieldSorters<Row> {
    FieldSorters::new().register("id", |a, b| a.id.cmp(&b.id))
}

/// Sorts a fixed demo record set by a registered field, then pages and binds into `Entry`.
#[derive(Default, Handler)]
#[handler(category = 3, method = 1)]
pub struct PagedList {
    #[param(index = -4, dir = "in")]
    skip: i32,
    #[param(index = -3, dir = "in")]
    take: i32,
    #[param(index = -2, dir = "in")]
    order_by_field: String,
    #[param(index = -1, dir = "in")]
    order_by_ascending: bool,
    #[param(index = -1, dir = "out")]
    list: Vec<Entry>,
    outbox: Vec<Notification>,
}

impl HandlerLogic for PagedList {
    fn is_valid(&self) -> ResponseCode {
        arke_core::validate_fields! {
            self.skip => arke_core::validation::AtLeast { min: 0, code: ResponseCode::INVALID_PARAMETERS },
            self.take => arke_core::validation::AtLeast { min: 0, code: ResponseCode::INVALID_PARAMETERS },
            self.order_by_field => arke_core::validation::NonEmptyString { code: ResponseCode::INVALID_PARAMETERS },
        }
    }

    fn process(
        &mut self,
        _db: &mut dyn DbContext,
        _authenticated_id: &mut AuthenticatedId,
    ) -> Result<ResponseCode, DbError> {
        match paged_list(
            demo_rows(),
            self.skip,
            self.take,
            &self.order_by_field,
            self.order_by_ascending,
            &sorters(),
            |row| Entry {
                id: row.id,
                name: row.name.clone(),
            },
        ) {
            Ok(list) => {
                self.list = list;
                Ok(ResponseCode::SUCCESS)
            }
            Err(code) => Ok(code),
        }
    }

    fn outbox(&mut self) -> &mut Vec<Notification> {
        &mut self.outbox
    }
}
