//! Per-client HTTP-FLV delivery.

mod session;

pub use session::{BodySender, FlvSession, SessionEnd, SessionState};
