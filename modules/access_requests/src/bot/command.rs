use thiserror::Error;

use crate::contract::model::Identity;

/// Slash commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Admin,
    ListRequests,
    Approve(Identity),
    Reject(Identity),
    Download(String),
    Unknown(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: {usage}")]
    MissingArgument { usage: &'static str },
    #[error("Invalid user id: {0}")]
    InvalidIdentity(String),
}

impl Command {
    /// Parse a message. Returns `None` when the text is not a command.
    ///
    /// A `@botname` suffix on the command word is ignored.
    pub fn parse(text: &str) -> Option<Result<Command, CommandError>> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let word = parts.next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();
        let arg = parts.next();

        let identity = |usage: &'static str| -> Result<Identity, CommandError> {
            arg.ok_or(CommandError::MissingArgument { usage })?
                .parse()
                .map_err(CommandError::InvalidIdentity)
        };

        Some(match name {
            "start" => Ok(Command::Start),
            "help" => Ok(Command::Help),
            "admin" => Ok(Command::Admin),
            "list_requests" => Ok(Command::ListRequests),
            "approve" => identity("/approve <user_id>").map(Command::Approve),
            "reject" => identity("/reject <user_id>").map(Command::Reject),
            "download" => arg
                .map(|url| Command::Download(url.to_owned()))
                .ok_or(CommandError::MissingArgument {
                    usage: "/download https://youtu.be/...",
                }),
            other => Ok(Command::Unknown(other.to_owned())),
        })
    }
}
