// Deployment modes: named scopes (dev, staging, prod) that resources can be
// assigned into. Assignment itself lives with the resource operations.

use futures_util::Stream;
use tracing::info;

use crate::client::{ApiResponse, GatewayClient};
use crate::connection::RemotePath;
use crate::error::Error;
use crate::models::{DeploymentMode, ModeDraft};
use crate::paginate::PageRequest;

fn modes_path() -> RemotePath {
    RemotePath::parse("mode")
}

impl GatewayClient {
    /// Lazily list deployment modes.
    pub fn list_modes(
        &self,
        page_size: usize,
    ) -> Result<impl Stream<Item = Result<DeploymentMode, Error>> + '_, Error> {
        let url = self.api_url(&modes_path())?;
        Ok(self.paginate(PageRequest::offset(url, page_size)))
    }

    pub async fn create_mode(&self, draft: &ModeDraft) -> Result<ApiResponse, Error> {
        if draft.name.as_deref().is_none_or(str::is_empty) {
            return Err(Error::config("a new deployment mode needs a name"));
        }
        info!(name = ?draft.name, "creating deployment mode");
        self.post_json(&modes_path(), &[], draft).await
    }

    /// `PUT mode/{name}`; a `name` in the draft renames the mode.
    pub async fn update_mode(&self, name: &str, draft: &ModeDraft) -> Result<ApiResponse, Error> {
        info!(name, "updating deployment mode");
        self.put_json(&modes_path().join(name), &[], draft).await
    }

    pub async fn delete_mode(&self, name: &str) -> Result<ApiResponse, Error> {
        info!(name, "deleting deployment mode");
        self.delete(&modes_path().join(name), &[]).await
    }
}
