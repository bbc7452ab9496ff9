//! Shared types.

mod media;
mod message;

pub use media::MediaType;
pub use message::{split_system, Message, MessageRole};
