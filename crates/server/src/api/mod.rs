pub mod batch;
pub mod handlers;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod settings;
pub mod ws;

pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};
