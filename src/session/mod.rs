//! Session boundary: the conversation log, the backend client and the
//! store that keeps the backend's view of the query context current.

pub mod client;
pub mod conversation;
pub mod store;

pub use client::{HealthStatus, HttpSessionClient, SessionClient, SessionInfo};
pub use conversation::Conversation;
pub use store::SessionContextStore;
