// Tag export, import, and live read/write.
//
// Imports are streamed from disk like any other upload; every import call
// carries an explicit collision policy.

use std::path::Path;

use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::client::{ApiRequest, ApiResponse, GatewayClient};
use crate::connection::RemotePath;
use crate::error::Error;
use crate::models::TagWrite;
use crate::transfer::{JSON, OCTET_STREAM, TransferDescriptor};

/// How an import treats tags that already exist.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString, strum::EnumIter,
)]
pub enum CollisionPolicy {
    Abort,
    Overwrite,
    Rename,
    Ignore,
    #[default]
    MergeOverwrite,
}

/// Tag file format, sent as the `type` query parameter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TagFormat {
    #[default]
    Json,
    Xml,
    Csv,
}

impl TagFormat {
    /// Infer the format from a file extension; unknown extensions are JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or_default()
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => JSON,
            Self::Xml | Self::Csv => OCTET_STREAM,
        }
    }
}

impl GatewayClient {
    /// `GET tags/export`. JSON callers parse the returned bytes.
    pub async fn export_tags(
        &self,
        provider: &str,
        path: Option<&str>,
        format: TagFormat,
    ) -> Result<Bytes, Error> {
        let mut request = ApiRequest::new(Method::GET, self.api_url(&RemotePath::parse("tags/export"))?)
            .query("provider", provider)
            .query("type", format);
        if let Some(path) = path {
            request = request.query("path", path);
        }
        Ok(self.execute(request).await?.body)
    }

    /// Stream a tag file to `POST tags/import`.
    ///
    /// The format comes from the file extension and the policy defaults to
    /// [`CollisionPolicy::MergeOverwrite`].
    pub async fn import_tags(
        &self,
        file: &Path,
        provider: &str,
        path: Option<&str>,
        policy: Option<CollisionPolicy>,
    ) -> Result<ApiResponse, Error> {
        let descriptor = tag_import(file, provider, path, policy.unwrap_or_default());
        info!(file = %file.display(), provider, "importing tags");
        self.upload(&descriptor).await
    }

    /// `POST tags/read` with a list of tag paths.
    ///
    /// Not a stock gateway endpoint: it needs WebDev or a custom module, and
    /// a gateway without it answers 404.
    pub async fn read_tags(&self, provider: &str, paths: &[&str]) -> Result<Vec<Value>, Error> {
        let response = self
            .post_json(&RemotePath::parse("tags/read"), &[("provider", provider)], paths)
            .await?;
        response.json()
    }

    /// `POST tags/write`. Same endpoint caveat as [`GatewayClient::read_tags`].
    pub async fn write_tags(
        &self,
        provider: &str,
        writes: &[TagWrite],
    ) -> Result<ApiResponse, Error> {
        info!(provider, count = writes.len(), "writing tags");
        self.post_json(&RemotePath::parse("tags/write"), &[("provider", provider)], writes)
            .await
    }
}

fn tag_import(
    file: &Path,
    provider: &str,
    path: Option<&str>,
    policy: CollisionPolicy,
) -> TransferDescriptor {
    let format = TagFormat::from_path(file);
    let descriptor = TransferDescriptor::new(file, RemotePath::parse("tags/import"))
        .content_type(format.content_type())
        .query("provider", provider)
        .query("type", format)
        .query("collisionPolicy", policy);
    match path {
        Some(path) => descriptor.query("path", path),
        None => descriptor,
    }
}
