//! Domain models for KLAPP messages

mod inbox;
mod message;

pub use inbox::{InboxReport, InboxSnapshot, MessageBrief};
pub use message::{MessageDetail, MessageId};
