//! Debug tools for navtri - TCP debug server for inspecting a running build
//!
//! Start the debug server in your app:
//! ```ignore
//! let handler = Arc::new(Mutex::new(MyHandler::new()));
//! let _server = DebugServer::start(handler, 9743);
//! ```
//!
//! Each request is one JSON [`DebugCommand`] per line, each reply one JSON
//! [`DebugResponse`] per line. [`DebugClient`] speaks the same protocol.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{DebugClient, ProtocolError};
pub use protocol::*;
pub use server::{DebugHandler, DebugServer};

/// Default debug server port
pub const DEFAULT_PORT: u16 = 9743;
