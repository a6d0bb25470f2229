//! HTTP transport for SOAP envelopes.
//!
//! Sessions depend on the [`SoapTransport`] trait rather than on reqwest
//! directly, so tests can substitute a spy and callers can share one
//! connection pool across every device.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use super::soap::{HttpReply, SoapResult};
use crate::protocol_constants::{SOAP_CONTENT_TYPE, SOAP_TIMEOUT_SECS};

/// Posts a SOAP envelope and returns the raw reply.
///
/// Implementations return `Ok` for any HTTP status; status interpretation
/// happens in the dispatcher.
#[async_trait]
pub trait SoapTransport: Send + Sync {
    async fn post(&self, endpoint: &str, envelope: String) -> SoapResult<HttpReply>;
}

/// reqwest-backed [`SoapTransport`].
#[derive(Debug, Clone)]
pub struct HttpSoapTransport {
    client: Client,
}

impl HttpSoapTransport {
    /// Creates a transport with its own client and the default request timeout.
    pub fn new() -> SoapResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SOAP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client (to share its connection pool).
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Creates a transport ready to hand to [`DeviceParams`](super::device::DeviceParams).
    pub fn shared() -> SoapResult<Arc<dyn SoapTransport>> {
        Ok(Arc::new(Self::new()?))
    }
}

#[async_trait]
impl SoapTransport for HttpSoapTransport {
    async fn post(&self, endpoint: &str, envelope: String) -> SoapResult<HttpReply> {
        let start = Instant::now();
        let res = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(envelope)
            .send()
            .await;

        log::debug!(
            "[SOAP] POST {} completed in {:?}: {:?}",
            endpoint,
            start.elapsed(),
            res.as_ref().map(|r| r.status())
        );

        let res = res?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(HttpReply { status, body })
    }
}
