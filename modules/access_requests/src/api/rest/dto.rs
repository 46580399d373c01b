use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bot::{Button, ButtonAction, ChatPayload, ChatUpdate, Reply};
use crate::contract::model::{
    Decision, HistoryRecord, Identity, PendingPage, RegisterOutcome, UserRecord,
};
use crate::domain::events::AccessEvent;

/// REST DTO for the current status of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessStatusDto {
    pub user_id: i64,
    /// One of `unknown`, `inactive`, `pending`, `approved`.
    pub state: String,
    pub approved: bool,
    pub pending: bool,
    pub status_since: Option<DateTime<Utc>>,
}

impl AccessStatusDto {
    pub fn from_record(user_id: Identity, record: Option<UserRecord>) -> Self {
        match record {
            Some(r) => Self {
                user_id: r.user_id.get(),
                state: r.status.as_str().to_owned(),
                approved: r.status.approved(),
                pending: r.status.pending(),
                status_since: Some(r.status_since),
            },
            None => Self {
                user_id: user_id.get(),
                state: "unknown".to_owned(),
                approved: false,
                pending: false,
                status_since: None,
            },
        }
    }
}

/// REST DTO for one history snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntryDto {
    pub sequence_id: i64,
    pub user_id: i64,
    pub approved: bool,
    pub pending: bool,
    pub status_since: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

impl From<HistoryRecord> for HistoryEntryDto {
    fn from(h: HistoryRecord) -> Self {
        Self {
            sequence_id: h.sequence_id,
            user_id: h.user_id.get(),
            approved: h.previous.approved(),
            pending: h.previous.pending(),
            status_since: h.previous_since,
            changed_at: h.changed_at,
        }
    }
}

/// REST DTO for a page of pending requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPageDto {
    pub items: Vec<i64>,
    pub page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl From<PendingPage> for PendingPageDto {
    fn from(p: PendingPage) -> Self {
        Self {
            has_prev: p.has_prev(),
            has_next: p.has_next(),
            items: p.items.into_iter().map(Identity::get).collect(),
            page: p.page,
            page_size: p.page_size,
            total_count: p.total_count,
            total_pages: p.total_pages,
        }
    }
}

/// REST DTO for query parameters of the pending list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponseDto {
    pub user_id: i64,
    /// One of `submitted`, `already_pending`, `already_approved`.
    pub outcome: String,
}

impl RegisterResponseDto {
    pub fn new(user_id: Identity, outcome: RegisterOutcome) -> Self {
        let outcome = match outcome {
            RegisterOutcome::Submitted => "submitted",
            RegisterOutcome::AlreadyPending => "already_pending",
            RegisterOutcome::AlreadyApproved => "already_approved",
        };
        Self {
            user_id: user_id.get(),
            outcome: outcome.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionDto {
    pub user_id: i64,
    /// `applied` or `unchanged`.
    pub outcome: String,
    /// Status of the user after the call.
    pub status: String,
}

impl DecisionDto {
    pub fn new(user_id: Identity, decision: Decision) -> Self {
        let (outcome, status) = match decision {
            Decision::Applied { status } => ("applied", status),
            Decision::Unchanged { current } => ("unchanged", current),
        };
        Self {
            user_id: user_id.get(),
            outcome: outcome.to_owned(),
            status: status.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadReq {
    pub url: String,
}

/// Inbound chat update: exactly one of `text` or `callback_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatUpdateDto {
    pub sender: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub callback_data: Option<String>,
}

impl TryFrom<ChatUpdateDto> for ChatUpdate {
    type Error = String;

    fn try_from(dto: ChatUpdateDto) -> Result<Self, Self::Error> {
        let payload = match (dto.text, dto.callback_data) {
            (Some(text), None) => ChatPayload::Text(text),
            (None, Some(data)) => ChatPayload::Callback(data),
            _ => return Err("exactly one of text or callback_data must be set".to_owned()),
        };
        Ok(ChatUpdate {
            sender: Identity(dto.sender),
            payload,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonDto {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&Button> for ButtonDto {
    fn from(b: &Button) -> Self {
        let (callback_data, url) = match &b.action {
            ButtonAction::Callback(action) => (Some(action.to_string()), None),
            ButtonAction::Url(url) => (None, Some(url.clone())),
        };
        Self {
            label: b.label.clone(),
            callback_data,
            url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyDto {
    pub to: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyboard: Vec<Vec<ButtonDto>>,
}

impl From<&Reply> for ReplyDto {
    fn from(r: &Reply) -> Self {
        Self {
            to: r.to.get(),
            text: r.text.clone(),
            keyboard: r
                .keyboard
                .iter()
                .map(|row| row.iter().map(ButtonDto::from).collect())
                .collect(),
        }
    }
}

/// Transport-level SSE payload for outbound chat messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDto {
    /// `submitted`, `approved` or `rejected`.
    pub kind: String,
    pub target: i64,
    pub at: DateTime<Utc>,
    pub message: ReplyDto,
}

impl NotificationDto {
    pub fn new(event: &AccessEvent, message: &Reply) -> Self {
        let kind = match event {
            AccessEvent::Submitted { .. } => "submitted",
            AccessEvent::Approved { .. } => "approved",
            AccessEvent::Rejected { .. } => "rejected",
        };
        Self {
            kind: kind.to_owned(),
            target: event.target().get(),
            at: event.at(),
            message: ReplyDto::from(message),
        }
    }
}

/// Optional filter for the notification stream: only messages addressed to `to`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsQuery {
    pub to: Option<i64>,
}
