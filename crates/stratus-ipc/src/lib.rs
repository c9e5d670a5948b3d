//! Control protocol and unix-socket server for Stratus
//!
//! Administrative clients (the `stratus` CLI) talk to the daemon over a
//! unix domain socket with a tiny line protocol: request strings terminated
//! by `;`, answered by a human-readable response terminated the same way.
//!
//! The [`server::ControlServer`] translates requests into watch-engine
//! calls; [`client::send_request`] is the one-shot client half.

pub mod client;
pub mod protocol;
pub mod server;

pub use protocol::{Command, ProtocolError, DELIMITER};
pub use server::ControlServer;
