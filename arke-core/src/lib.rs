pub mod cache;
pub mod db;
pub mod dispatch;
pub mod handler;
pub mod notify;
pub mod paged;
pub mod registry;
pub mod response;
pub mod schema;
#[macro_use]
pub mod validation;
pub mod wire;

pub use arke_macros::{Handler, WireCodec};
