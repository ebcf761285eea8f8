//! HTTP transport seam.
//!
//! The fetch engine talks to the network through [`Transport`] so the retry
//! state machine can be exercised against canned responses. The production
//! implementation builds one reqwest client per attempt: a fresh cookie jar
//! per identity, shared across that attempt's warmup and listing requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::fetch::identity::BrowserIdentity;

/// Minimal response view the engine classifies on.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub final_url: String,
    pub body: String,
}

/// One simulated browser session: consistent identity and cookie jar.
#[async_trait]
pub trait TransportSession: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse, String>;
}

/// Factory for sessions.
pub trait Transport: Send + Sync {
    fn session(
        &self,
        identity: &BrowserIdentity,
        timeout: Duration,
    ) -> Result<Box<dyn TransportSession>, String>;
}

/// Production transport backed by reqwest.
pub struct ReqwestTransport;

pub struct ReqwestSession {
    client: reqwest::Client,
}

impl Transport for ReqwestTransport {
    fn session(
        &self,
        identity: &BrowserIdentity,
        timeout: Duration,
    ) -> Result<Box<dyn TransportSession>, String> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(identity.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(identity.accept_language)?);
        if let Some(sec_ch_ua) = identity.sec_ch_ua {
            headers.insert("sec-ch-ua", header_value(sec_ch_ua)?);
            headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        }
        if let Some(platform) = identity.sec_ch_ua_platform {
            headers.insert("sec-ch-ua-platform", header_value(platform)?);
        }
        headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .user_agent(identity.user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;

        Ok(Box::new(ReqwestSession { client }))
    }
}

#[async_trait]
impl TransportSession for ReqwestSession {
    async fn get(&self, url: &str) -> Result<TransportResponse, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| e.to_string())?;
        Ok(TransportResponse {
            status,
            final_url,
            body,
        })
    }
}

fn header_value(s: &str) -> Result<HeaderValue, String> {
    HeaderValue::from_str(s).map_err(|e| format!("invalid header value: {e}"))
}
