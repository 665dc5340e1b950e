// ── Gateway resources ──
//
// Resources are addressed by `(module, type, name?, collection?)`. Update and
// delete need the resource's current signature, and that signature belongs to
// one scope: a mode-scoped copy of a resource has its own signature, distinct
// from the base resource's. `SignatureResolver` always looks the signature up
// at the scope being mutated.

use std::fmt;
use std::str::FromStr;

use futures_util::Stream;
use reqwest::Method;
use tracing::{debug, info};

use crate::client::{ApiRequest, ApiResponse, GatewayClient};
use crate::connection::RemotePath;
use crate::error::Error;
use crate::models::Resource;
use crate::paginate::{PageRequest, decode_items};
use crate::transfer::TransferDescriptor;

// ── Identity ─────────────────────────────────────────────────────────

/// A `module/type` pair such as `ignition/database-connection`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceType {
    pub module: String,
    pub type_name: String,
}

impl ResourceType {
    pub fn new(module: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            type_name: type_name.into(),
        }
    }

    /// Parse `module/type`. Anything else is a configuration error.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw.split_once('/') {
            Some((module, kind)) if !module.is_empty() && !kind.is_empty() && !kind.contains('/') => {
                Ok(Self::new(module, kind))
            }
            _ => Err(Error::config(format!(
                "invalid resource type '{raw}': expected 'module/type' (e.g. ignition/database-connection)"
            ))),
        }
    }

    /// `resources/{op}/{module}/{type}`; an empty `op` gives `resources/{module}/{type}`.
    pub(crate) fn path(&self, op: &str) -> RemotePath {
        let base = RemotePath::parse("resources");
        let base = if op.is_empty() { base } else { base.join(op) };
        base.join(self.module.as_str()).join(self.type_name.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module, self.type_name)
    }
}

/// Identity of one resource: named or singleton, base or mode-scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub resource_type: ResourceType,
    /// `None` for singleton resources.
    pub name: Option<String>,
    /// Deployment mode; `None` addresses the base resource.
    pub collection: Option<String>,
}

impl ResourceReference {
    pub fn named(resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            resource_type,
            name: Some(name.into()),
            collection: None,
        }
    }

    pub fn singleton(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            name: None,
            collection: None,
        }
    }

    /// The same resource scoped to a deployment mode.
    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// The unscoped counterpart of this reference.
    pub fn base(&self) -> Self {
        Self {
            collection: None,
            ..self.clone()
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.name.is_none()
    }

    fn scope(&self) -> String {
        match &self.collection {
            Some(mode) => format!("mode '{mode}'"),
            None => "the base configuration".to_owned(),
        }
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}/{name}", self.resource_type)?,
            None => write!(f, "{} (singleton)", self.resource_type)?,
        }
        if let Some(mode) = &self.collection {
            write!(f, " @ {mode}")?;
        }
        Ok(())
    }
}

/// Opaque version token issued by the gateway for one resource at one scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceSignature(String);

impl ResourceSignature {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Signature resolution ─────────────────────────────────────────────

/// A resource looked up at the scope about to be mutated.
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    /// The name to put in mutation paths (taken from the body for singletons).
    pub name: String,
    pub signature: ResourceSignature,
    pub resource: Resource,
    /// Deleting at this scope needs `confirm=true`.
    pub requires_confirmation: bool,
}

/// Looks up current signatures before update or delete.
pub struct SignatureResolver<'a> {
    client: &'a GatewayClient,
    default_if_undefined: bool,
}

impl GatewayClient {
    pub fn signatures(&self) -> SignatureResolver<'_> {
        SignatureResolver {
            client: self,
            default_if_undefined: false,
        }
    }
}

impl SignatureResolver<'_> {
    /// For singletons that were never configured, ask the gateway for a
    /// synthesized default instead of a 404.
    pub fn default_if_undefined(mut self, enabled: bool) -> Self {
        self.default_if_undefined = enabled;
        self
    }

    /// Fetch the resource at the reference's scope.
    pub async fn lookup(&self, reference: &ResourceReference) -> Result<Resource, Error> {
        let rt = &reference.resource_type;
        let mut request = match &reference.name {
            Some(name) => ApiRequest::new(
                Method::GET,
                self.client.api_url(&rt.path("find").join(name.as_str()))?,
            ),
            None => {
                let request =
                    ApiRequest::new(Method::GET, self.client.api_url(&rt.path("singleton"))?);
                if self.default_if_undefined {
                    request.query("defaultIfUndefined", "true")
                } else {
                    request
                }
            }
        };
        if let Some(mode) = &reference.collection {
            request = request.query("collection", mode);
        }

        match self.client.execute(request).await {
            Ok(response) => response.json(),
            Err(e) if e.is_not_found() => Err(Error::NotFound {
                message: format!("resource {reference} not found in {}", reference.scope()),
            }),
            Err(e) => Err(e),
        }
    }

    /// Look up the resource and extract its signature for this scope.
    pub async fn resolve(&self, reference: &ResourceReference) -> Result<ResolvedResource, Error> {
        let resource = self.lookup(reference).await?;
        let signature = resource
            .signature
            .clone()
            .filter(|s| !s.is_empty())
            .map(ResourceSignature::new)
            .ok_or_else(|| {
                Error::general(format!("no signature found on resource {reference}"))
            })?;
        let name = reference
            .name
            .clone()
            .or_else(|| resource.name.clone())
            .unwrap_or_default();
        debug!(%reference, %signature, "resolved resource signature");
        Ok(ResolvedResource {
            name,
            signature,
            requires_confirmation: reference.collection.is_some(),
            resource,
        })
    }
}

// ── Operations ───────────────────────────────────────────────────────

impl GatewayClient {
    /// Lazily list resources of one type.
    pub fn list_resources(
        &self,
        resource_type: &ResourceType,
        page_size: usize,
    ) -> Result<impl Stream<Item = Result<Resource, Error>> + '_, Error> {
        let url = self.api_url(&resource_type.path("list"))?;
        Ok(self.paginate(PageRequest::offset(url, page_size)))
    }

    /// Names of every resource of one type.
    pub async fn resource_names(&self, resource_type: &ResourceType) -> Result<Vec<String>, Error> {
        let url = self.api_url(&resource_type.path("names"))?;
        let response = self.execute(ApiRequest::new(Method::GET, url)).await?;
        decode_items(&response)
    }

    /// Fetch one resource (named or singleton) at its scope.
    pub async fn find_resource(&self, reference: &ResourceReference) -> Result<Resource, Error> {
        self.signatures().lookup(reference).await
    }

    /// Fetch a singleton, optionally synthesizing a default if unset.
    pub async fn singleton_resource(
        &self,
        resource_type: &ResourceType,
        default_if_undefined: bool,
    ) -> Result<Resource, Error> {
        self.signatures()
            .default_if_undefined(default_if_undefined)
            .lookup(&ResourceReference::singleton(resource_type.clone()))
            .await
    }

    /// `POST resources/{m}/{t}` with a one-element array.
    pub async fn create_resource(
        &self,
        resource_type: &ResourceType,
        resource: &Resource,
    ) -> Result<ApiResponse, Error> {
        let body = Resource {
            signature: None,
            ..resource.clone()
        };
        info!(%resource_type, name = ?body.name, collection = ?body.collection, "creating resource");
        self.post_json(&resource_type.path(""), &[], &[body]).await
    }

    /// `PUT resources/{m}/{t}`. When the body carries no signature, the
    /// current one is looked up at the reference's scope.
    pub async fn update_resource(
        &self,
        reference: &ResourceReference,
        resource: &Resource,
    ) -> Result<ApiResponse, Error> {
        let mut body = resource.clone();
        if body.collection.is_none() {
            body.collection.clone_from(&reference.collection);
        }
        if body.signature.is_none() {
            let resolved = self.signatures().resolve(reference).await?;
            body.signature = Some(resolved.signature.to_string());
            if body.name.is_none() {
                body.name = Some(resolved.name);
            }
        } else if body.name.is_none() {
            body.name.clone_from(&reference.name);
        }
        info!(%reference, "updating resource");
        self.put_json(&reference.resource_type.path(""), &[], &[body])
            .await
    }

    /// Delete a resource after resolving its signature at the reference's scope.
    ///
    /// `confirm` is sent only for mode-scoped references; whether it is needed
    /// is reported by [`ResolvedResource::requires_confirmation`].
    pub async fn delete_resource(
        &self,
        reference: &ResourceReference,
        confirm: bool,
    ) -> Result<ApiResponse, Error> {
        let resolved = self.signatures().resolve(reference).await?;
        let confirm = confirm && resolved.requires_confirmation;
        self.delete_resource_with(reference, &resolved.name, &resolved.signature, confirm)
            .await
    }

    /// `DELETE resources/{m}/{t}/{name}/{signature}` with a known signature.
    pub async fn delete_resource_with(
        &self,
        reference: &ResourceReference,
        name: &str,
        signature: &ResourceSignature,
        confirm: bool,
    ) -> Result<ApiResponse, Error> {
        let path = reference
            .resource_type
            .path("")
            .join(name)
            .join(signature.as_str());
        let mut query = Vec::new();
        if let Some(mode) = &reference.collection {
            query.push(("collection", mode.as_str()));
        }
        if confirm {
            query.push(("confirm", "true"));
        }
        info!(%reference, "deleting resource");
        self.delete(&path, &query).await
    }

    /// Copy a base resource's configuration into a deployment mode.
    pub async fn assign_to_mode(
        &self,
        reference: &ResourceReference,
        mode: &str,
    ) -> Result<ApiResponse, Error> {
        let base = self.signatures().lookup(&reference.base()).await?;
        let name = reference
            .name
            .clone()
            .or_else(|| base.name.clone())
            .unwrap_or_default();
        let body = base.for_collection(&name, mode);
        info!(%reference, mode, "assigning resource to mode");
        self.post_json(&reference.resource_type.path(""), &[], &[body])
            .await
    }

    /// Remove a resource's mode-scoped copy, using the scoped signature.
    pub async fn unassign_from_mode(
        &self,
        reference: &ResourceReference,
        mode: &str,
    ) -> Result<ApiResponse, Error> {
        let scoped = reference.clone().in_collection(mode);
        let resolved = self.signatures().resolve(&scoped).await?;
        self.delete_resource_with(&scoped, &resolved.name, &resolved.signature, true)
            .await
    }

    // ── Data files ───────────────────────────────────────────────────

    /// Upload a data file to a named resource, resolving its signature first.
    pub async fn upload_datafile(
        &self,
        reference: &ResourceReference,
        filename: &str,
        local_path: &std::path::Path,
    ) -> Result<ApiResponse, Error> {
        let resolved = self.signatures().resolve(reference).await?;
        let descriptor = TransferDescriptor::datafile_upload(
            local_path,
            &reference.resource_type,
            &resolved.name,
            filename,
            &resolved.signature,
        );
        self.upload(&descriptor).await
    }

    /// Download a resource's data file. Returns bytes written.
    pub async fn download_datafile(
        &self,
        reference: &ResourceReference,
        filename: &str,
        local_path: &std::path::Path,
    ) -> Result<u64, Error> {
        let name = reference.name.as_deref().ok_or_else(|| {
            Error::config(format!("data files need a named resource, got {reference}"))
        })?;
        let descriptor = TransferDescriptor::datafile_download(
            local_path,
            &reference.resource_type,
            name,
            filename,
        );
        self.download(&descriptor).await
    }
}
