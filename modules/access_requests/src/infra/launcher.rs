use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use crate::contract::model::Identity;
use crate::domain::ports::DownloadLauncher;

/// Runs `<script> <url> <user_id>` for every accepted link.
///
/// The child is detached from the request: a background task waits for it and
/// logs the exit status.
pub struct ScriptLauncher {
    script: PathBuf,
}

impl ScriptLauncher {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl DownloadLauncher for ScriptLauncher {
    fn launch(&self, url: &Url, requester: Identity) -> anyhow::Result<()> {
        let mut child = Command::new(&self.script)
            .arg(url.as_str())
            .arg(requester.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn '{}'", self.script.display()))?;

        let pid = child.id();
        debug!(?pid, user_id = %requester, "Download script spawned");

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => info!(?pid, "Download script finished"),
                Ok(status) => warn!(?pid, %status, "Download script exited with failure"),
                Err(e) => warn!(?pid, "Failed to wait for download script: {e}"),
            }
        });
        Ok(())
    }
}
