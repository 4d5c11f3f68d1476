pub mod message;
pub mod row;

pub use message::{Message, MessageState};
pub use row::{Row, row_from_pairs};
