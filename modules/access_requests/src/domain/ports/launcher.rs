use url::Url;

use crate::contract::model::Identity;

/// Output port: hand a validated media URL to the external downloader.
///
/// Implementations start the job and return without waiting for it to finish.
pub trait DownloadLauncher: Send + Sync + 'static {
    fn launch(&self, url: &Url, requester: Identity) -> anyhow::Result<()>;
}
