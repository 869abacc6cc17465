//! The lakehouse client.
//!
//! # Design
//! `LakehouseClient` is a cheap-to-clone handle over read-only shared state:
//! configuration, authenticator and transport. Concurrent calls share it
//! without locking. Every operation method is a thin wrapper that takes a
//! `RequestBuilder` from [`crate::operations`] and runs it through
//! [`LakehouseClient::execute`].

mod buckets;
mod catalog;
mod databases;
mod engines;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::operation::{Operation, RequestBuilder};
use crate::pipeline::{self, DispatchSettings, ResponseEnvelope};
use crate::transport::{ReqwestTransport, Transport};

pub struct LakehouseClient<T = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    config: ClientConfig,
    base_url: String,
    headers: Vec<(String, String)>,
    auth: Arc<dyn Authenticator>,
    transport: T,
}

impl<T> Clone for LakehouseClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for LakehouseClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LakehouseClient")
            .field("base_url", &self.inner.base_url)
            .field("auth", &self.inner.auth)
            .finish_non_exhaustive()
    }
}

impl LakehouseClient<ReqwestTransport> {
    /// Client over the default reqwest transport.
    pub fn new(config: ClientConfig, auth: impl Authenticator + 'static) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, auth, transport))
    }
}

impl<T: Transport> LakehouseClient<T> {
    pub fn with_transport(
        config: ClientConfig,
        auth: impl Authenticator + 'static,
        transport: T,
    ) -> Self {
        Self::with_shared_auth(config, Arc::new(auth), transport)
    }

    pub fn with_shared_auth(
        config: ClientConfig,
        auth: Arc<dyn Authenticator>,
        transport: T,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                base_url: config.base_url.as_str().to_string(),
                headers: config.request_headers(),
                config,
                auth,
                transport,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Build and authenticate a request without sending it.
    ///
    /// Together with [`LakehouseClient::decode`] this lets the caller run the
    /// HTTP exchange itself.
    pub fn prepare(&self, builder: RequestBuilder) -> Result<HttpRequest> {
        let mut request = builder.build(&self.inner.base_url, &self.inner.headers)?;
        self.inner.auth.authenticate(&mut request)?;
        Ok(request)
    }

    /// Decode a response obtained for a request from [`LakehouseClient::prepare`].
    pub fn decode<R: DeserializeOwned>(
        &self,
        operation: &Operation,
        response: HttpResponse,
    ) -> Result<ResponseEnvelope<R>> {
        pipeline::decode(operation, response)
    }

    /// Build, send and decode one call.
    pub async fn execute<R: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ResponseEnvelope<R>> {
        self.execute_with_cancel(builder, &CancellationToken::new())
            .await
    }

    /// Like [`LakehouseClient::execute`], aborting with `Cancelled` once
    /// `cancel` fires.
    #[instrument(skip_all, fields(operation = builder.operation().name))]
    pub async fn execute_with_cancel<R: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<R>> {
        let operation = *builder.operation();
        let policy = &self.inner.config.retry;
        let settings = DispatchSettings {
            policy,
            attempt_timeout: self.inner.config.timeout,
            retryable: builder.is_retryable(policy.retry_all_methods),
        };

        let request = self.prepare(builder)?;
        let response =
            pipeline::dispatch(&self.inner.transport, &operation, &request, settings, cancel)
                .await?;
        pipeline::decode(&operation, response)
    }
}
