// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::bosh::connection::CONTENT_TYPE;
use crate::bosh::BoshError;

/// The HTTP seam of the BOSH transport.
///
/// Production code uses [`ReqwestPoster`]; tests substitute a scripted
/// implementation. Every request must observe the session token.
#[async_trait]
pub trait BoshPoster: Send + Sync {
    async fn post(
        &self,
        url: &Url,
        body: String,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, BoshError>;
}

/// [`BoshPoster`] backed by a shared `reqwest` client.
#[derive(Default)]
pub struct ReqwestPoster {
    client: reqwest::Client,
}

impl ReqwestPoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes all requests through the given proxy URL.
    pub fn with_proxy(proxy: &str) -> Result<Self, BoshError> {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| BoshError::Network(e.to_string()))?;
        let client = reqwest::Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| BoshError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BoshPoster for ReqwestPoster {
    async fn post(
        &self,
        url: &Url,
        body: String,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, BoshError> {
        let request = self
            .client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .timeout(timeout)
            .body(body);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(BoshError::Cancelled),
            result = request.send() => result.map_err(|e| BoshError::Network(e.to_string()))?,
        };

        if !response.status().is_success() {
            return Err(BoshError::Network(format!(
                "unexpected HTTP status {}",
                response.status()
            )));
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(BoshError::Cancelled),
            text = response.text() => text.map_err(|e| BoshError::Network(e.to_string())),
        }
    }
}
