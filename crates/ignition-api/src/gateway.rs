// Gateway-wide operations: info, modules, scans, backup/restore, projects,
// logs.

use std::path::Path;

use futures_util::Stream;
use reqwest::Method;
use serde_json::json;
use tracing::info;

use crate::client::{ApiRequest, ApiResponse, GatewayClient};
use crate::connection::RemotePath;
use crate::error::Error;
use crate::models::{
    GatewayInfo, LogEntry, LoggerLevel, ModuleInfo, ProjectDraft, ProjectSummary,
};
use crate::paginate::{PageRequest, decode_listing};
use crate::transfer::TransferDescriptor;

impl GatewayClient {
    pub async fn gateway_info(&self) -> Result<GatewayInfo, Error> {
        self.get_json(&RemotePath::parse("gateway-info"), &[]).await
    }

    /// Installed modules, or the quarantined ones.
    pub async fn list_modules(&self, quarantined: bool) -> Result<Vec<ModuleInfo>, Error> {
        let which = if quarantined { "quarantined" } else { "healthy" };
        let url = self.api_url(&RemotePath::new(["modules", which]))?;
        let response = self.execute(ApiRequest::new(Method::GET, url)).await?;
        decode_listing(&response, "modules")
    }

    /// Ask the gateway to rescan project files on disk.
    pub async fn scan_projects(&self) -> Result<(), Error> {
        self.scan("projects").await
    }

    /// Ask the gateway to rescan configuration files on disk.
    pub async fn scan_config(&self) -> Result<(), Error> {
        self.scan("config").await
    }

    async fn scan(&self, target: &str) -> Result<(), Error> {
        let url = self.api_url(&RemotePath::new(["scan", target]))?;
        self.execute(ApiRequest::new(Method::POST, url)).await?;
        info!(target, "scan triggered");
        Ok(())
    }

    // ── Backup ───────────────────────────────────────────────────────

    /// Download a gateway backup (`.gwbk`). Returns bytes written.
    pub async fn backup(&self, dest: &Path) -> Result<u64, Error> {
        self.download(&TransferDescriptor::backup(dest)).await
    }

    /// Restore a gateway backup.
    pub async fn restore(&self, src: &Path) -> Result<ApiResponse, Error> {
        self.upload(&TransferDescriptor::restore(src)).await
    }

    // ── Projects ─────────────────────────────────────────────────────

    /// Lazily list projects.
    pub fn list_projects(
        &self,
        page_size: usize,
    ) -> Result<impl Stream<Item = Result<ProjectSummary, Error>> + '_, Error> {
        let url = self.api_url(&RemotePath::parse("projects/list"))?;
        Ok(self.paginate(PageRequest::offset(url, page_size)))
    }

    pub async fn find_project(&self, name: &str) -> Result<ProjectSummary, Error> {
        self.get_json(&RemotePath::new(["projects", "find", name]), &[])
            .await
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<ApiResponse, Error> {
        if draft.name.trim().is_empty() {
            return Err(Error::config("a new project needs a name"));
        }
        info!(name = %draft.name, "creating project");
        self.post_json(&RemotePath::parse("projects"), &[], draft)
            .await
    }

    pub async fn delete_project(&self, name: &str) -> Result<ApiResponse, Error> {
        info!(name, "deleting project");
        self.delete(&RemotePath::new(["projects", name]), &[]).await
    }

    pub async fn copy_project(&self, from: &str, to: &str) -> Result<ApiResponse, Error> {
        info!(from, to, "copying project");
        let body = json!({ "fromName": from, "toName": to });
        self.post_json(&RemotePath::parse("projects/copy"), &[], &body)
            .await
    }

    pub async fn rename_project(&self, name: &str, new_name: &str) -> Result<ApiResponse, Error> {
        info!(name, new_name, "renaming project");
        let body = json!({ "name": new_name });
        self.post_json(&RemotePath::new(["projects", "rename", name]), &[], &body)
            .await
    }

    /// Export a project as a zip. Returns bytes written.
    pub async fn export_project(&self, name: &str, dest: &Path) -> Result<u64, Error> {
        self.download(&TransferDescriptor::project_export(dest, name))
            .await
    }

    /// Import a project zip; `overwrite` replaces an existing project.
    pub async fn import_project(
        &self,
        name: &str,
        src: &Path,
        overwrite: bool,
    ) -> Result<ApiResponse, Error> {
        self.upload(&TransferDescriptor::project_import(src, name, overwrite))
            .await
    }

    // ── Logs ─────────────────────────────────────────────────────────

    /// The most recent `limit` log events, optionally at or above `level`.
    pub async fn query_logs(
        &self,
        limit: usize,
        level: Option<&str>,
    ) -> Result<Vec<LogEntry>, Error> {
        let url = self.api_url(&RemotePath::parse("logs"))?;
        let mut request = ApiRequest::new(Method::GET, url).query("limit", limit);
        if let Some(level) = level {
            request = request.query("level", level);
        }
        decode_listing(&self.execute(request).await?, "logs")
    }

    pub async fn loggers(&self) -> Result<Vec<LoggerLevel>, Error> {
        let url = self.api_url(&RemotePath::parse("logs/loggers"))?;
        decode_listing(&self.execute(ApiRequest::new(Method::GET, url)).await?, "loggers")
    }

    /// Download the gateway log archive. Returns bytes written.
    pub async fn download_logs(&self, dest: &Path) -> Result<u64, Error> {
        self.download(&TransferDescriptor::log_download(dest)).await
    }
}
