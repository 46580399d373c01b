use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::contract::model::{
    Decision, EventOutcome, HistoryRecord, Identity, InboundEvent, PendingPage, RegisterOutcome,
    UserRecord, UserStatus,
};
use crate::domain::error::DomainError;
use crate::domain::events::AccessEvent;
use crate::domain::media::parse_media_url;
use crate::domain::pagination::PageRequest;
use crate::domain::policy::AccessPolicy;
use crate::domain::ports::{DownloadLauncher, EventPublisher};
use crate::domain::repo::{StatusStore, TransitionOutcome};

/// Request lifecycle manager: registration, admin decisions and the pending queue.
/// Depends only on the store and output ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    store: Arc<dyn StatusStore>,
    policy: AccessPolicy,
    events: Arc<dyn EventPublisher<AccessEvent>>,
    launcher: Arc<dyn DownloadLauncher>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub allowed_hosts: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            allowed_hosts: vec![
                "youtube.com".to_owned(),
                "www.youtube.com".to_owned(),
                "m.youtube.com".to_owned(),
                "youtu.be".to_owned(),
            ],
        }
    }
}

fn storage(e: anyhow::Error) -> DomainError {
    error!("Status store failure: {e:#}");
    DomainError::storage(e.to_string())
}

fn ensure_valid(field: &str, identity: Identity) -> Result<(), DomainError> {
    if identity.is_valid() {
        Ok(())
    } else {
        Err(DomainError::invalid_input(
            field,
            format!("identity must be positive, got {identity}"),
        ))
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        store: Arc<dyn StatusStore>,
        policy: AccessPolicy,
        events: Arc<dyn EventPublisher<AccessEvent>>,
        launcher: Arc<dyn DownloadLauncher>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            policy,
            events,
            launcher,
            config,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn is_admin(&self, identity: Identity) -> bool {
        self.policy.is_admin(identity)
    }

    /// Dispatch a transport-neutral inbound event.
    pub async fn handle(&self, event: InboundEvent) -> Result<EventOutcome, DomainError> {
        match event {
            InboundEvent::Register { identity } => {
                self.register(identity).await.map(EventOutcome::Registered)
            }
            InboundEvent::AdminApprove { identity, target } => {
                let decision = self.approve(identity, target).await?;
                Ok(EventOutcome::Decided { target, decision })
            }
            InboundEvent::AdminReject { identity, target } => {
                let decision = self.reject(identity, target).await?;
                Ok(EventOutcome::Decided { target, decision })
            }
            InboundEvent::AdminListPending { identity, page } => self
                .list_pending(identity, page, None)
                .await
                .map(EventOutcome::Pending),
        }
    }

    #[instrument(name = "access_requests.service.register", skip(self), fields(user_id = %identity))]
    pub async fn register(&self, identity: Identity) -> Result<RegisterOutcome, DomainError> {
        ensure_valid("identity", identity)?;

        match self.store.get_status(identity).await.map_err(storage)? {
            Some(UserStatus::Pending) => {
                debug!("Request already pending");
                return Ok(RegisterOutcome::AlreadyPending);
            }
            Some(UserStatus::Approved) => {
                debug!("User already approved");
                return Ok(RegisterOutcome::AlreadyApproved);
            }
            Some(UserStatus::Inactive) => {}
            None => {
                let created = self
                    .store
                    .create_if_absent(identity)
                    .await
                    .map_err(storage)?;
                debug!(created, "Ensured user record");
            }
        }

        let outcome = self
            .store
            .transition_from(identity, UserStatus::Inactive, UserStatus::Pending)
            .await
            .map_err(storage)?;

        match outcome {
            TransitionOutcome::Applied { .. } => {
                self.events.publish(&AccessEvent::Submitted {
                    target: identity,
                    at: Utc::now(),
                });
                info!("Access request submitted");
                Ok(RegisterOutcome::Submitted)
            }
            // Lost a race against another register or an admin decision.
            TransitionOutcome::Skipped {
                current: UserStatus::Approved,
            } => Ok(RegisterOutcome::AlreadyApproved),
            TransitionOutcome::Skipped { .. } => Ok(RegisterOutcome::AlreadyPending),
            TransitionOutcome::Missing => Err(DomainError::not_found(identity)),
        }
    }

    #[instrument(
        name = "access_requests.service.approve",
        skip(self),
        fields(actor = %actor, target = %target)
    )]
    pub async fn approve(&self, actor: Identity, target: Identity) -> Result<Decision, DomainError> {
        self.decide(actor, target, UserStatus::Approved).await
    }

    #[instrument(
        name = "access_requests.service.reject",
        skip(self),
        fields(actor = %actor, target = %target)
    )]
    pub async fn reject(&self, actor: Identity, target: Identity) -> Result<Decision, DomainError> {
        self.decide(actor, target, UserStatus::Inactive).await
    }

    async fn decide(
        &self,
        actor: Identity,
        target: Identity,
        to: UserStatus,
    ) -> Result<Decision, DomainError> {
        if let Err(e) = self.policy.authorize_admin(actor) {
            warn!("Admin action denied");
            return Err(e);
        }
        ensure_valid("target", target)?;

        let outcome = self
            .store
            .transition_from(target, UserStatus::Pending, to)
            .await
            .map_err(storage)?;

        match outcome {
            TransitionOutcome::Applied { .. } => {
                let at = Utc::now();
                let event = if to.approved() {
                    AccessEvent::Approved { target, at }
                } else {
                    AccessEvent::Rejected { target, at }
                };
                self.events.publish(&event);
                info!(status = %to, "Request resolved");
                Ok(Decision::Applied { status: to })
            }
            TransitionOutcome::Skipped { current } => {
                debug!(current = %current, "Request not pending, nothing to do");
                Ok(Decision::Unchanged { current })
            }
            TransitionOutcome::Missing => Err(DomainError::not_found(target)),
        }
    }

    /// One page of the pending queue. `page_size` falls back to the configured default.
    #[instrument(name = "access_requests.service.list_pending", skip(self), fields(actor = %actor))]
    pub async fn list_pending(
        &self,
        actor: Identity,
        page: u64,
        page_size: Option<u64>,
    ) -> Result<PendingPage, DomainError> {
        if let Err(e) = self.policy.authorize_admin(actor) {
            warn!("Pending list denied");
            return Err(e);
        }
        let request = PageRequest::new(
            page,
            page_size.unwrap_or(self.config.default_page_size),
            self.config.max_page_size,
        )?;

        let (items, total_count) = self
            .store
            .list_pending(request.offset(), request.page_size())
            .await
            .map_err(storage)?;

        let page = request.assemble(items, total_count);
        debug!(
            "Listed {} of {} pending requests (page {}/{})",
            page.items.len(),
            page.total_count,
            page.page,
            page.total_pages
        );
        Ok(page)
    }

    /// Current record of `target`, visible to the admin and to the user itself.
    #[instrument(name = "access_requests.service.status", skip(self), fields(actor = %actor, target = %target))]
    pub async fn status(
        &self,
        actor: Identity,
        target: Identity,
    ) -> Result<Option<UserRecord>, DomainError> {
        ensure_valid("target", target)?;
        self.policy.authorize_view(actor, target)?;
        self.store.find(target).await.map_err(storage)
    }

    #[instrument(name = "access_requests.service.is_approved", skip(self), fields(user_id = %identity))]
    pub async fn is_approved(&self, identity: Identity) -> Result<bool, DomainError> {
        let status = self.store.get_status(identity).await.map_err(storage)?;
        Ok(self.policy.can_download(status))
    }

    /// Status change audit trail of `target` (admin only).
    #[instrument(name = "access_requests.service.history", skip(self), fields(actor = %actor, target = %target))]
    pub async fn history(
        &self,
        actor: Identity,
        target: Identity,
    ) -> Result<Vec<HistoryRecord>, DomainError> {
        self.policy.authorize_admin(actor)?;
        ensure_valid("target", target)?;
        if self.store.find(target).await.map_err(storage)?.is_none() {
            return Err(DomainError::not_found(target));
        }
        self.store.history(target).await.map_err(storage)
    }

    /// Validate `raw_url` and hand it to the downloader on behalf of an approved user.
    #[instrument(name = "access_requests.service.request_download", skip(self, raw_url), fields(user_id = %identity))]
    pub async fn request_download(
        &self,
        identity: Identity,
        raw_url: &str,
    ) -> Result<(), DomainError> {
        ensure_valid("identity", identity)?;
        if !self.is_approved(identity).await? {
            warn!("Download attempted without access");
            return Err(DomainError::not_approved(identity));
        }

        let url = parse_media_url(raw_url, &self.config.allowed_hosts)?;
        self.launcher.launch(&url, identity).map_err(|e| {
            error!("Download launch failed: {e:#}");
            DomainError::launch(e.to_string())
        })?;

        info!(url = %url, "Download started");
        Ok(())
    }
}
