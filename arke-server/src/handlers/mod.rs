mod echo;
mod login;
mod paged_list;
mod ping;
mod retry_demo;

pub use echo::Echo;
pub use login::{Login, Logout};
pub use paged_list::PagedList;
pub use ping::Ping;
pub use retry_demo::RetryDemo;

use arke_core::registry::Registration;

/// The demonstration handler set wired into every worker's registry.
pub fn registrations() -> Vec<Registration> {
    vec![
        Registration::of::<Ping>(false, || Box::new(Ping::default())),
        Registration::of::<Echo>(false, || Box::new(Echo::default())),
        Registration::of::<PagedList>(false, || Box::new(PagedList::default())),
        Registration::of::<RetryDemo>(false, || Box::new(RetryDemo::default())),
        Registration::of::<Login>(false, || Box::new(Login::default())),
        Registration::of::<Logout>(true, || Box::new(Logout::default())),
    ]
}
