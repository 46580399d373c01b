//! Transport-independent chat front-end: decodes updates, drives the
//! lifecycle through the public API and renders replies.

pub mod callback;
pub mod command;
pub mod dispatcher;
pub mod reply;
pub mod session;

pub use dispatcher::{BotDispatcher, ChatPayload, ChatUpdate};
pub use reply::{Button, ButtonAction, Reply};
