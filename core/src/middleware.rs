//! Request middleware.
//!
//! Each layer receives the request plus a [`Next`] handle for the rest of
//! the chain; the chain bottoms out at the [`Transport`]. Layers only see
//! transport-level outcomes; status-code handling happens in the client.

use crate::config::RetryPolicy;
use crate::error::TransportError;
use crate::session::Session;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::warn;

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError>;
}

/// The remainder of the chain after the current layer.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    transport: &'a dyn Transport,
    layers: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub fn new(transport: &'a dyn Transport, layers: &'a [Arc<dyn Middleware>]) -> Self {
        Self { transport, layers }
    }

    pub async fn run(self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.layers.split_first() {
            Some((layer, rest)) => {
                layer
                    .handle(
                        request,
                        Next {
                            transport: self.transport,
                            layers: rest,
                        },
                    )
                    .await
            }
            None => self.transport.send(request).await,
        }
    }
}

/// Injects `Authorization: Bearer <token>` from the session context.
pub struct AuthLayer {
    session: Session,
}

impl AuthLayer {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Middleware for AuthLayer {
    async fn handle(
        &self,
        mut request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        self.session.authorize(&mut request);
        next.run(request).await
    }
}

/// Re-sends GET requests that failed with a network or timeout error.
/// Everything else passes through untouched.
pub struct RetryLayer {
    policy: RetryPolicy,
}

impl RetryLayer {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Middleware for RetryLayer {
    async fn handle(
        &self,
        request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        let mut retries = 0;
        loop {
            match next.run(request.clone()).await {
                Err(err)
                    if request.method == Method::GET
                        && err.is_network()
                        && retries < self.policy.max_retries =>
                {
                    retries += 1;
                    warn!(
                        url = %request.url,
                        attempt = retries,
                        %err,
                        "retrying request after network failure"
                    );
                    sleep(self.policy.delay()).await;
                }
                outcome => return outcome,
            }
        }
    }
}
