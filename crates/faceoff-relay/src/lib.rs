//! Passive room relay for faceoff.
//!
//! Hosts and viewers connect over WebSocket and `join` a room named by
//! the match id. Everything a member sends after that is copied verbatim
//! to the other members of the room. The relay keeps no match state; the
//! host is the only authority.
//!
//! The relay also answers `catalogAppend` requests by appending the text
//! to a JSON-lines log when one is configured.
//!
//! ```text
//! conn ─► handler ─► RoomRegistry ─► RoomActor ─► other members
//!            └─────► CatalogLog
//! ```

mod catalog;
mod config;
mod error;
mod handler;
mod registry;
mod room;
mod server;

pub use catalog::CatalogLog;
pub use config::{BIND_VAR, CATALOG_VAR, RelayConfig};
pub use error::RelayError;
pub use registry::RoomRegistry;
pub use room::{Frame, MemberSender, RoomHandle, RoomInfo};
pub use server::{RelayMonitor, RelayServer, RelayServerBuilder};
