pub mod address;
pub mod book;
pub mod message;
pub mod query;

pub use address::{AddressScheme, ResourceAddress, ResourceType};
pub use book::{Book, BookFields, Column, FieldValue};
pub use message::{AddressData, ChangeEvent, ErrorData, MessageType, WebSocketMessage};
pub use query::{Direction, Filter, Projection, SortOrder};
