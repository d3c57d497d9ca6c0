//! HTTP surface: stream delivery, pull trigger and stream listing.

mod path;
mod router;
mod server;

pub use path::PathResolver;
pub use router::{create_router, HdlState, ListCache};
pub use server::HdlServer;
