//! Message routing on top of compiled conditions.

pub mod message;
pub mod route;
pub mod router;

pub use message::Message;
pub use route::Route;
pub use router::{RouteError, Router};
