// ── Streaming file transfer ──
//
// Large artifacts (gateway backups, project exports, tag exports, data
// files, log archives) move between a local path and a gateway endpoint in
// bounded chunks. Neither direction holds the whole file in memory.
//
// Downloads truncate the destination; a failed download can leave a partial
// file behind. Uploads send `Content-Length` when the file size is known.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use reqwest::Method;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::client::{ApiRequest, ApiResponse, GatewayClient, RequestBody};
use crate::connection::RemotePath;
use crate::error::Error;
use crate::resources::{ResourceSignature, ResourceType};

/// Chunk size for uploads.
pub const CHUNK_SIZE: usize = 64 * 1024;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const ZIP: &str = "application/zip";
pub const JSON: &str = "application/json";

/// One file transfer between a local path and a gateway endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferDescriptor {
    pub local_path: PathBuf,
    /// Endpoint path under the API root.
    pub remote_path: RemotePath,
    pub content_type: String,
    /// Expected size in bytes, checked after a download when known.
    pub expected_size: Option<u64>,
    /// Upload method; downloads always `GET`.
    pub method: Method,
    pub query: Vec<(String, String)>,
}

impl TransferDescriptor {
    pub fn new(local_path: impl Into<PathBuf>, remote_path: RemotePath) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path,
            content_type: OCTET_STREAM.to_owned(),
            expected_size: None,
            method: Method::POST,
            query: Vec::new(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn expected_size(mut self, size: u64) -> Self {
        self.expected_size = Some(size);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    // ── Common endpoints ─────────────────────────────────────────────

    /// `GET /backup` into a `.gwbk` file.
    pub fn backup(local_path: impl Into<PathBuf>) -> Self {
        Self::new(local_path, RemotePath::parse("backup"))
    }

    /// `POST /backup` from a `.gwbk` file.
    pub fn restore(local_path: impl Into<PathBuf>) -> Self {
        Self::new(local_path, RemotePath::parse("backup"))
    }

    /// `GET /projects/export/{name}` into a zip.
    pub fn project_export(local_path: impl Into<PathBuf>, project: &str) -> Self {
        Self::new(local_path, RemotePath::new(["projects", "export", project]))
    }

    /// `POST /projects/import/{name}` from a zip.
    pub fn project_import(local_path: impl Into<PathBuf>, project: &str, overwrite: bool) -> Self {
        let descriptor = Self::new(local_path, RemotePath::new(["projects", "import", project]))
            .content_type(ZIP);
        if overwrite {
            descriptor.query("overwrite", "true")
        } else {
            descriptor
        }
    }

    /// `GET /logs/download` into a zip.
    pub fn log_download(local_path: impl Into<PathBuf>) -> Self {
        Self::new(local_path, RemotePath::parse("logs/download"))
    }

    /// `PUT /resources/datafile/{m}/{t}/{name}/{file}?signature=`.
    pub fn datafile_upload(
        local_path: impl Into<PathBuf>,
        resource_type: &ResourceType,
        name: &str,
        filename: &str,
        signature: &ResourceSignature,
    ) -> Self {
        Self::new(local_path, datafile_path(resource_type, name, filename))
            .method(Method::PUT)
            .query("signature", signature)
    }

    /// `GET /resources/datafile/{m}/{t}/{name}/{file}`.
    pub fn datafile_download(
        local_path: impl Into<PathBuf>,
        resource_type: &ResourceType,
        name: &str,
        filename: &str,
    ) -> Self {
        Self::new(local_path, datafile_path(resource_type, name, filename))
    }
}

fn datafile_path(resource_type: &ResourceType, name: &str, filename: &str) -> RemotePath {
    resource_type.path("datafile").join(name).join(filename)
}

/// Bytes moved so far and the total when known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferProgress {
    pub transferred: u64,
    pub total: Option<u64>,
}

/// A transfer handle with an observable progress channel.
///
/// Obtained from [`GatewayClient::transfer`]. Subscribe with
/// [`Transfer::progress`] before starting the transfer.
pub struct Transfer<'a> {
    client: &'a GatewayClient,
    progress: Arc<watch::Sender<TransferProgress>>,
}

impl GatewayClient {
    pub fn transfer(&self) -> Transfer<'_> {
        let (tx, _rx) = watch::channel(TransferProgress::default());
        Transfer {
            client: self,
            progress: Arc::new(tx),
        }
    }

    /// Download without progress reporting. Returns bytes written.
    pub async fn download(&self, descriptor: &TransferDescriptor) -> Result<u64, Error> {
        self.transfer().download(descriptor).await
    }

    /// Upload without progress reporting.
    pub async fn upload(&self, descriptor: &TransferDescriptor) -> Result<ApiResponse, Error> {
        self.transfer().upload(descriptor).await
    }
}

impl Transfer<'_> {
    /// Subscribe to progress updates.
    pub fn progress(&self) -> watch::Receiver<TransferProgress> {
        self.progress.subscribe()
    }

    /// Stream a local file to the gateway.
    pub async fn upload(&self, descriptor: &TransferDescriptor) -> Result<ApiResponse, Error> {
        let path = &descriptor.local_path;
        let file = File::open(path)
            .await
            .map_err(|e| Error::local_io(path, &e))?;
        let size = file.metadata().await.ok().map(|m| m.len());
        self.progress.send_replace(TransferProgress {
            transferred: 0,
            total: size,
        });

        let stream = chunked(file, Arc::clone(&self.progress));

        let url = self.client.api_url(&descriptor.remote_path)?;
        info!(file = %path.display(), %url, size = ?size, "uploading");
        let request = ApiRequest::new(descriptor.method.clone(), url)
            .query_pairs(descriptor.query.iter().cloned())
            .body(RequestBody::Stream {
                body: reqwest::Body::wrap_stream(stream),
                content_type: descriptor.content_type.clone(),
                content_length: size,
            });

        let response = self.client.execute_streaming(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.client.transport_error(&e))?;
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// Stream a gateway response into a local file. Returns bytes written.
    pub async fn download(&self, descriptor: &TransferDescriptor) -> Result<u64, Error> {
        let url = self.client.api_url(&descriptor.remote_path)?;
        let request =
            ApiRequest::new(Method::GET, url).query_pairs(descriptor.query.iter().cloned());
        let mut response = self.client.execute_streaming(request).await?;

        let total = response.content_length();
        self.progress.send_replace(TransferProgress {
            transferred: 0,
            total,
        });

        let path = &descriptor.local_path;
        let mut file = create_destination(path).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.client.transport_error(&e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::local_io(path, &e))?;
            written += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
            self.progress.send_modify(|p| p.transferred = written);
        }
        file.flush().await.map_err(|e| Error::local_io(path, &e))?;
        debug!(file = %path.display(), written, "download finished");

        check_size(written, descriptor.expected_size)?;
        Ok(written)
    }
}

/// Read `file` lazily in chunks of at most [`CHUNK_SIZE`] bytes, counting
/// each chunk into `progress` as it is handed to the body.
fn chunked(
    file: File,
    progress: Arc<watch::Sender<TransferProgress>>,
) -> impl Stream<Item = std::io::Result<Bytes>> {
    ReaderStream::with_capacity(file, CHUNK_SIZE).inspect_ok(move |chunk| {
        let len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        progress.send_modify(|p| p.transferred += len);
    })
}

async fn create_destination(path: &Path) -> Result<File, Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::local_io(parent, &e))?;
    }
    File::create(path)
        .await
        .map_err(|e| Error::local_io(path, &e))
}

fn check_size(written: u64, expected: Option<u64>) -> Result<(), Error> {
    match expected {
        Some(expected) if expected != written => Err(Error::general(format!(
            "download size mismatch: expected {expected} bytes, received {written}"
        ))),
        Some(_) => Ok(()),
        None if written == 0 => Err(Error::general("gateway returned an empty download")),
        None => Ok(()),
    }
}
