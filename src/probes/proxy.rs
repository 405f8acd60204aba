use log::debug;
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Proxy};
use serde::Serialize;
use std::time::Duration;

use super::target_url;
use crate::error::BugscanError;

/// Everything recorded about one request routed through the proxy, kept
/// for manual inspection. Headers preserve response order.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyResult {
    pub proxy: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
}

/// Probes how a hostname behaves when reached through a configured HTTP
/// proxy. Redirects are never followed; the interesting data is what the
/// proxy hands back, not where it points.
pub struct ProxyProbe {
    client: Client,
    proxy: String,
    method: Method,
    port: u16,
}

impl ProxyProbe {
    pub fn new(
        proxy: &str,
        method: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, BugscanError> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| BugscanError::Config(format!("invalid HTTP method: {}", method)))?;
        let client = Client::builder()
            .proxy(Proxy::all(format!("http://{}", proxy))?)
            .redirect(Policy::none())
            .timeout(timeout)
            .build()?;

        Ok(ProxyProbe {
            client,
            proxy: proxy.to_string(),
            method,
            port,
        })
    }

    /// Failed targets are skipped outright: `None` means nothing gets
    /// reported, though the attempt itself is still cached by the caller.
    pub async fn probe(&self, hostname: &str) -> Option<ProxyResult> {
        let url = target_url(hostname, self.port);
        let response = match self.client.request(self.method.clone(), &url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!("{} {} via {} failed: {}", self.method, url, self.proxy, err);
                return None;
            }
        };

        Some(ProxyResult {
            proxy: self.proxy.clone(),
            method: self.method.to_string(),
            url: response.url().to_string(),
            status_code: response.status().as_u16(),
            headers: response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}
