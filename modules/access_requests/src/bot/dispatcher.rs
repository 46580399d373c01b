use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::bot::callback::CallbackAction;
use crate::bot::command::Command;
use crate::bot::reply::{self, Reply};
use crate::bot::session::{ConversationMode, SessionStore};
use crate::contract::client::AccessRequestsApi;
use crate::contract::error::AccessError;
use crate::contract::model::{Decision, Identity, RegisterOutcome};

/// An inbound chat message or button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUpdate {
    /// User who sent the message or pressed the button.
    pub sender: Identity,
    pub payload: ChatPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPayload {
    Text(String),
    Callback(String),
}

/// Turns chat updates into lifecycle calls and replies. Never fails: every
/// error becomes a message for the sender.
pub struct BotDispatcher {
    api: Arc<dyn AccessRequestsApi>,
    sessions: SessionStore,
}

impl BotDispatcher {
    pub fn new(api: Arc<dyn AccessRequestsApi>) -> Self {
        Self {
            api,
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[instrument(name = "access_requests.bot.handle", skip(self, update), fields(sender = %update.sender))]
    pub async fn handle(&self, update: ChatUpdate) -> Vec<Reply> {
        let sender = update.sender;
        if !sender.is_valid() {
            warn!("Update from invalid sender ignored");
            return Vec::new();
        }
        match update.payload {
            ChatPayload::Text(text) => self.on_text(sender, &text).await,
            ChatPayload::Callback(data) => self.on_callback(sender, &data).await,
        }
    }

    async fn on_text(&self, sender: Identity, text: &str) -> Vec<Reply> {
        let command = match Command::parse(text) {
            Some(Ok(command)) => command,
            Some(Err(e)) => return vec![Reply::text(sender, e.to_string())],
            None => {
                return match self.sessions.take_mode(sender) {
                    ConversationMode::AwaitingLink => vec![self.download(sender, text).await],
                    ConversationMode::Idle => vec![Reply::text(sender, reply::ONLY_COMMANDS)],
                };
            }
        };
        debug!(?command, "Command received");

        match command {
            Command::Start => vec![self.register(sender).await],
            Command::Help => vec![reply::help(sender, self.api.is_admin(sender))],
            Command::Admin if self.api.is_admin(sender) => vec![reply::admin_menu(sender)],
            Command::Admin => vec![Reply::text(sender, reply::NOT_AUTHORIZED)],
            Command::ListRequests => vec![self.show_pending(sender).await],
            Command::Approve(target) => vec![self.decide(sender, target, true).await],
            Command::Reject(target) => vec![self.decide(sender, target, false).await],
            Command::Download(url) => vec![self.download(sender, &url).await],
            Command::Unknown(_) => vec![Reply::text(sender, reply::UNKNOWN_COMMAND)],
        }
    }

    async fn on_callback(&self, sender: Identity, data: &str) -> Vec<Reply> {
        let action: CallbackAction = match data.parse() {
            Ok(action) => action,
            Err(e) => {
                warn!("Rejected callback: {e}");
                return vec![Reply::text(sender, reply::STALE_BUTTON)];
            }
        };
        if action.is_admin_action() && !self.api.is_admin(sender) {
            warn!(%action, "Admin callback from non-admin");
            return vec![Reply::text(sender, reply::NOT_AUTHORIZED)];
        }

        match action {
            CallbackAction::ListRequests => vec![self.show_pending(sender).await],
            CallbackAction::Approve(target) => vec![
                self.decide(sender, target, true).await,
                self.show_pending(sender).await,
            ],
            CallbackAction::Reject(target) => vec![
                self.decide(sender, target, false).await,
                self.show_pending(sender).await,
            ],
            CallbackAction::PrevPage => {
                self.sessions
                    .update(sender, |s| s.admin_page = s.admin_page.saturating_sub(1).max(1));
                vec![self.show_pending(sender).await]
            }
            CallbackAction::NextPage => {
                self.sessions
                    .update(sender, |s| s.admin_page = s.admin_page.saturating_add(1));
                vec![self.show_pending(sender).await]
            }
            CallbackAction::RequestAccess => vec![self.register(sender).await],
            CallbackAction::Download => match self.api.is_approved(sender).await {
                Ok(true) => {
                    self.sessions
                        .update(sender, |s| s.mode = ConversationMode::AwaitingLink);
                    vec![Reply::text(sender, reply::SEND_LINK)]
                }
                Ok(false) => vec![Reply::text(sender, reply::NOT_APPROVED)],
                Err(e) => vec![error_reply(sender, &e)],
            },
        }
    }

    async fn register(&self, sender: Identity) -> Reply {
        match self.api.register(sender).await {
            Ok(RegisterOutcome::Submitted) => Reply::text(sender, reply::REQUEST_SENT),
            Ok(RegisterOutcome::AlreadyPending) => Reply::text(sender, reply::ALREADY_PENDING),
            Ok(RegisterOutcome::AlreadyApproved) => reply::user_menu(sender, true),
            Err(e) => error_reply(sender, &e),
        }
    }

    async fn decide(&self, sender: Identity, target: Identity, approve: bool) -> Reply {
        let result = if approve {
            self.api.approve(sender, target).await
        } else {
            self.api.reject(sender, target).await
        };
        match result {
            Ok(Decision::Applied { .. }) if approve => {
                Reply::text(sender, format!("User {target} approved."))
            }
            Ok(Decision::Applied { .. }) => Reply::text(sender, format!("User {target} rejected.")),
            Ok(Decision::Unchanged { current }) => Reply::text(
                sender,
                format!("User {target} has no pending request (currently {current})."),
            ),
            Err(e) => error_reply(sender, &e),
        }
    }

    async fn download(&self, sender: Identity, url: &str) -> Reply {
        let url = url.trim();
        match self.api.request_download(sender, url).await {
            Ok(()) => reply::download_started(sender, url),
            Err(AccessError::Validation { .. }) => Reply::text(sender, reply::NOT_A_LINK),
            Err(e) => error_reply(sender, &e),
        }
    }

    /// Render the admin's current page, clamping it to the last page when the
    /// queue shrank underneath.
    async fn show_pending(&self, sender: Identity) -> Reply {
        let page = self.sessions.get(sender).admin_page;
        let mut listed = self.api.list_pending(sender, page, None).await;

        if let Ok(p) = &listed {
            if p.items.is_empty() && p.total_pages > 0 && p.page > p.total_pages {
                let last = p.total_pages;
                self.sessions.update(sender, |s| s.admin_page = last);
                listed = self.api.list_pending(sender, last, None).await;
            } else if p.total_pages == 0 {
                self.sessions.update(sender, |s| s.admin_page = 1);
            }
        }

        match listed {
            Ok(p) => reply::pending_list(sender, &p),
            Err(e) => error_reply(sender, &e),
        }
    }
}

fn error_reply(to: Identity, e: &AccessError) -> Reply {
    match e {
        AccessError::NotAuthorized => Reply::text(to, reply::NOT_AUTHORIZED),
        AccessError::NotApproved { .. } => Reply::text(to, reply::NOT_APPROVED),
        AccessError::NotFound { user_id } => {
            Reply::text(to, format!("No request from user {user_id}."))
        }
        AccessError::Validation { message } => Reply::text(to, format!("Invalid input: {message}")),
        AccessError::Internal => Reply::text(to, reply::INTERNAL_ERROR),
    }
}
