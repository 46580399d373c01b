use crate::bot::callback::CallbackAction;
use crate::contract::model::{Identity, PendingPage};
use crate::domain::events::AccessEvent;

/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(CallbackAction),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(action),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

/// A message to send back, with an optional inline keyboard (rows of buttons).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub to: Identity,
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

impl Reply {
    pub fn text(to: Identity, text: impl Into<String>) -> Self {
        Self {
            to,
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    pub fn with_keyboard(mut self, keyboard: Vec<Vec<Button>>) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// All callback payloads on the keyboard, in order.
    pub fn callbacks(&self) -> Vec<CallbackAction> {
        self.keyboard
            .iter()
            .flatten()
            .filter_map(|b| match b.action {
                ButtonAction::Callback(a) => Some(a),
                ButtonAction::Url(_) => None,
            })
            .collect()
    }
}

pub const COMMON_COMMANDS: &str = "Available commands:\n\
/start - Show the main menu or request access.\n\
/download <url> - Download a video.";

pub const ADMIN_COMMANDS: &str = "Admin commands:\n\
/admin - Open the admin menu.\n\
/list_requests - Show pending requests.\n\
/approve <user_id> - Approve a request.\n\
/reject <user_id> - Reject a request.";

pub const NOT_AUTHORIZED: &str = "You are not authorized.";
pub const REQUEST_SENT: &str = "Your access request has been sent to the administrator.";
pub const ALREADY_PENDING: &str = "Your request is already awaiting review by the administrator.";
pub const NOT_APPROVED: &str = "You don't have access yet. Send /start to request it.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Send /help to see what is available.";
pub const ONLY_COMMANDS: &str = "I only understand commands. Send /help to see the list.";
pub const SEND_LINK: &str = "Send me a YouTube link as a regular message.";
pub const NOT_A_LINK: &str = "That doesn't look like a YouTube link. Try again.";
pub const STALE_BUTTON: &str = "This button is no longer valid.";
pub const NO_PENDING: &str = "No pending requests.";
pub const INTERNAL_ERROR: &str = "Something went wrong. Please try again later.";

pub fn help(to: Identity, is_admin: bool) -> Reply {
    if is_admin {
        Reply::text(to, format!("{COMMON_COMMANDS}\n\n{ADMIN_COMMANDS}"))
    } else {
        Reply::text(to, COMMON_COMMANDS)
    }
}

pub fn admin_menu(to: Identity) -> Reply {
    Reply::text(to, "Admin menu:").with_keyboard(vec![vec![Button::callback(
        "Pending requests",
        CallbackAction::ListRequests,
    )]])
}

pub fn user_menu(to: Identity, approved: bool) -> Reply {
    let button = if approved {
        Button::callback("Download video", CallbackAction::Download)
    } else {
        Button::callback("Request access", CallbackAction::RequestAccess)
    };
    Reply::text(to, "What would you like to do?").with_keyboard(vec![vec![button]])
}

pub fn download_started(to: Identity, url: &str) -> Reply {
    Reply::text(to, format!("Link \"{url}\" accepted, starting download..."))
}

/// Pending list with profile links, decision buttons and page navigation.
pub fn pending_list(to: Identity, page: &PendingPage) -> Reply {
    if page.items.is_empty() {
        return Reply::text(to, NO_PENDING);
    }

    let mut keyboard = Vec::with_capacity(page.items.len() * 2 + 1);
    for &id in &page.items {
        keyboard.push(vec![Button::url(
            format!("Profile {id}"),
            format!("tg://user?id={id}"),
        )]);
        keyboard.push(vec![
            Button::callback(format!("Approve {id}"), CallbackAction::Approve(id)),
            Button::callback(format!("Reject {id}"), CallbackAction::Reject(id)),
        ]);
    }

    if page.total_pages > 1 {
        let mut nav = Vec::with_capacity(2);
        if page.has_prev() {
            nav.push(Button::callback("< Back", CallbackAction::PrevPage));
        }
        if page.has_next() {
            nav.push(Button::callback("Next >", CallbackAction::NextPage));
        }
        keyboard.push(nav);
    }

    Reply::text(
        to,
        format!(
            "Pending requests (page {}/{}):",
            page.page, page.total_pages
        ),
    )
    .with_keyboard(keyboard)
}

/// Outbound message produced by a committed transition: to the target for
/// decisions, to the admin for new requests.
pub fn notification(event: &AccessEvent, admin: Identity) -> Reply {
    match event {
        AccessEvent::Submitted { target, .. } => Reply::text(
            admin,
            format!("New access request from {target}."),
        )
        .with_keyboard(vec![
            vec![Button::url("Profile", format!("tg://user?id={target}"))],
            vec![
                Button::callback(format!("Approve {target}"), CallbackAction::Approve(*target)),
                Button::callback(format!("Reject {target}"), CallbackAction::Reject(*target)),
            ],
        ]),
        AccessEvent::Approved { target, .. } => Reply::text(
            *target,
            "Your access request was approved. Send /start to open the menu.",
        ),
        AccessEvent::Rejected { target, .. } => {
            Reply::text(*target, "Your access request was rejected.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: Vec<i64>, page: u64, total_count: u64, total_pages: u64) -> PendingPage {
        PendingPage {
            items: items.into_iter().map(Identity).collect(),
            page,
            page_size: 2,
            total_count,
            total_pages,
        }
    }

    #[test]
    fn single_page_has_no_navigation() {
        let reply = pending_list(Identity(1), &page(vec![5, 6], 1, 2, 1));
        assert_eq!(reply.text, "Pending requests (page 1/1):");
        assert_eq!(reply.keyboard.len(), 4);
        assert_eq!(
            reply.keyboard[0][0].action,
            ButtonAction::Url("tg://user?id=5".into())
        );
        assert_eq!(
            reply.callbacks(),
            vec![
                CallbackAction::Approve(Identity(5)),
                CallbackAction::Reject(Identity(5)),
                CallbackAction::Approve(Identity(6)),
                CallbackAction::Reject(Identity(6)),
            ]
        );
    }

    #[test]
    fn middle_page_has_both_directions() {
        let reply = pending_list(Identity(1), &page(vec![3, 4], 2, 6, 3));
        let nav = reply.keyboard.last().unwrap();
        assert_eq!(nav.len(), 2);
        assert!(reply.callbacks().contains(&CallbackAction::PrevPage));
        assert!(reply.callbacks().contains(&CallbackAction::NextPage));
    }

    #[test]
    fn first_and_last_pages_have_one_direction() {
        let first = pending_list(Identity(1), &page(vec![1, 2], 1, 3, 2));
        assert!(first.callbacks().contains(&CallbackAction::NextPage));
        assert!(!first.callbacks().contains(&CallbackAction::PrevPage));

        let last = pending_list(Identity(1), &page(vec![3], 2, 3, 2));
        assert!(last.callbacks().contains(&CallbackAction::PrevPage));
        assert!(!last.callbacks().contains(&CallbackAction::NextPage));
    }

    #[test]
    fn empty_page_says_so() {
        let reply = pending_list(Identity(1), &page(vec![], 1, 0, 0));
        assert_eq!(reply.text, NO_PENDING);
        assert!(reply.keyboard.is_empty());
    }

    #[test]
    fn help_lists_admin_commands_only_for_admin() {
        assert!(help(Identity(1), true).text.contains("/list_requests"));
        assert!(!help(Identity(2), false).text.contains("/list_requests"));
    }
}
