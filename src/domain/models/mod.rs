mod action;
mod backend;
mod chat_error;
mod event;
mod identity;
mod language;
mod message;
mod outcome;
mod persona;
mod session;
mod slash_commands;
mod store;

pub use action::*;
pub use backend::*;
pub use chat_error::*;
pub use event::*;
pub use identity::*;
pub use language::*;
pub use message::*;
pub use outcome::*;
pub use persona::*;
pub use session::*;
pub use slash_commands::*;
pub use store::*;
