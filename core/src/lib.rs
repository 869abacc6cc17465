//! Async client for the lakehouse management service.
//!
//! # Overview
//! Every remote call is described by a static [`Operation`] (name, method,
//! path template, documented success status) and assembled with a
//! [`RequestBuilder`]. One shared pipeline builds the request, authenticates
//! it, sends it through a [`Transport`] with retries, and decodes the
//! response into a [`ResponseEnvelope`] or an [`ApiError`].
//!
//! # Design
//! - Request building and response decoding never touch the network. Hosts
//!   that run HTTP themselves use [`LakehouseClient::prepare`] and
//!   [`LakehouseClient::decode`] around their own I/O.
//! - `LakehouseClient` holds only read-only state behind an `Arc`; clones are
//!   cheap and calls may run concurrently.
//! - Resource operations live in [`operations`] as plain builder functions and
//!   as async methods on the client.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod operation;
pub mod operations;
pub mod patch;
pub mod pipeline;
pub mod transport;
pub mod types;

pub use auth::{ApiKeyAuthenticator, Authenticator, BearerTokenAuthenticator, NoAuth};
pub use client::LakehouseClient;
pub use config::{ClientConfig, ClientConfigBuilder, RetryPolicy, TlsConfig};
pub use error::{ApiError, ErrorDetail, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::{Multipart, Part};
pub use operation::{Operation, RequestBuilder};
pub use operations::catalog::{SchemaRef, TableRef};
pub use patch::{JsonPatchOperation, PatchOp};
pub use pipeline::ResponseEnvelope;
pub use tokio_util::sync::CancellationToken;
pub use transport::{ReqwestTransport, Transport};
