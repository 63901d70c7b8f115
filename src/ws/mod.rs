pub mod connection;
pub mod message_router;

pub use connection::{Connection, handle_socket};
pub use message_router::{DefaultMessageRouter, MessageRouter};
