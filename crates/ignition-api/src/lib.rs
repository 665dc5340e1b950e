// ignition-api: Async Rust client for the Ignition gateway REST API (/data/api/v1)

pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod models;
pub mod modes;
pub mod openapi;
pub mod paginate;
pub mod resources;
pub mod tags;
pub mod transfer;
pub mod transport;

pub use auth::{AuthStrategy, Credential};
pub use client::{ApiRequest, ApiResponse, GatewayClient, RequestBody};
pub use connection::{RemotePath, ResolvedConnection};
pub use error::{Error, ErrorKind, exit_code};
pub use openapi::EndpointInfo;
pub use paginate::{PageCursor, PageEnvelope, PageRequest};
pub use resources::{
    ResolvedResource, ResourceReference, ResourceSignature, ResourceType, SignatureResolver,
};
pub use tags::{CollisionPolicy, TagFormat};
pub use transfer::{Transfer, TransferDescriptor, TransferProgress};
pub use transport::TransportConfig;
