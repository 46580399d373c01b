use async_trait::async_trait;

use crate::contract::{
    error::AccessError,
    model::{Decision, Identity, PendingPage, RegisterOutcome, UserRecord},
};

/// Public API trait for the access_requests module that other modules (and the chat front-end) use
#[async_trait]
pub trait AccessRequestsApi: Send + Sync {
    /// Whether `identity` is the configured administrator
    fn is_admin(&self, identity: Identity) -> bool;

    /// Ask for access on behalf of `identity`
    async fn register(&self, identity: Identity) -> Result<RegisterOutcome, AccessError>;

    /// Grant a pending request (admin only)
    async fn approve(&self, actor: Identity, target: Identity) -> Result<Decision, AccessError>;

    /// Deny a pending request (admin only)
    async fn reject(&self, actor: Identity, target: Identity) -> Result<Decision, AccessError>;

    /// One page of pending requests (admin only). `page` is 1-based.
    async fn list_pending(
        &self,
        actor: Identity,
        page: u64,
        page_size: Option<u64>,
    ) -> Result<PendingPage, AccessError>;

    /// Current record of `target`; callers may only look at themselves unless admin
    async fn status(
        &self,
        actor: Identity,
        target: Identity,
    ) -> Result<Option<UserRecord>, AccessError>;

    /// Whether `identity` currently has access
    async fn is_approved(&self, identity: Identity) -> Result<bool, AccessError>;

    /// Start a media download for an approved user
    async fn request_download(&self, identity: Identity, url: &str) -> Result<(), AccessError>;
}
