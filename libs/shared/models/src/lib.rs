pub mod chat;
pub mod error;

pub use chat::{ChatMessage, ChatRole};
pub use error::AppError;
