use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the access_requests module (`modules.access_requests`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessRequestsConfig {
    /// Sender identity allowed to review requests.
    pub admin_identity: i64,
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default)]
    pub download: DownloadConfig,
    /// Buffered outbound notifications per SSE subscriber.
    #[serde(default = "default_notifications_capacity")]
    pub notifications_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    #[serde(default = "default_script_path")]
    pub script_path: String,
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            script_path: default_script_path(),
            allowed_hosts: default_allowed_hosts(),
        }
    }
}

impl AccessRequestsConfig {
    pub fn new(admin_identity: i64) -> Self {
        Self {
            admin_identity,
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            download: DownloadConfig::default(),
            notifications_capacity: default_notifications_capacity(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.admin_identity <= 0 {
            anyhow::bail!("admin_identity must be a positive user id");
        }
        if self.max_page_size == 0 {
            anyhow::bail!("max_page_size must be at least 1");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "default_page_size must be between 1 and max_page_size ({})",
                self.max_page_size
            );
        }
        if self.notifications_capacity == 0 {
            anyhow::bail!("notifications_capacity must be at least 1");
        }
        Ok(())
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            allowed_hosts: self.download.allowed_hosts.clone(),
        }
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

fn default_notifications_capacity() -> usize {
    256
}

fn default_script_path() -> String {
    "./download.sh".to_string()
}

fn default_allowed_hosts() -> Vec<String> {
    ServiceConfig::default().allowed_hosts
}
