use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::AccessRequestsApi,
    error::AccessError,
    model::{Decision, Identity, PendingPage, RegisterOutcome, UserRecord},
};
use crate::domain::service::Service;

/// Local implementation of the AccessRequestsApi trait that delegates to the domain service
pub struct AccessRequestsLocalClient {
    service: Arc<Service>,
}

impl AccessRequestsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AccessRequestsApi for AccessRequestsLocalClient {
    fn is_admin(&self, identity: Identity) -> bool {
        self.service.is_admin(identity)
    }

    async fn register(&self, identity: Identity) -> Result<RegisterOutcome, AccessError> {
        Ok(self.service.register(identity).await?)
    }

    async fn approve(&self, actor: Identity, target: Identity) -> Result<Decision, AccessError> {
        Ok(self.service.approve(actor, target).await?)
    }

    async fn reject(&self, actor: Identity, target: Identity) -> Result<Decision, AccessError> {
        Ok(self.service.reject(actor, target).await?)
    }

    async fn list_pending(
        &self,
        actor: Identity,
        page: u64,
        page_size: Option<u64>,
    ) -> Result<PendingPage, AccessError> {
        Ok(self.service.list_pending(actor, page, page_size).await?)
    }

    async fn status(
        &self,
        actor: Identity,
        target: Identity,
    ) -> Result<Option<UserRecord>, AccessError> {
        Ok(self.service.status(actor, target).await?)
    }

    async fn is_approved(&self, identity: Identity) -> Result<bool, AccessError> {
        Ok(self.service.is_approved(identity).await?)
    }

    async fn request_download(&self, identity: Identity, url: &str) -> Result<(), AccessError> {
        Ok(self.service.request_download(identity, url).await?)
    }
}
