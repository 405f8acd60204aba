use log::debug;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::target_url;
use crate::error::BugscanError;

/// Outcome of one direct HTTP probe. Both fields empty means the target
/// did not answer within the timeout; that is a valid negative result and
/// is cached like any other.
#[derive(Debug, Clone, Serialize)]
pub struct DirectResult {
    pub status_code: Option<u16>,
    pub server: Option<String>,
}

/// Probes a resolved address with a plain HTTP(S) HEAD request and records
/// the status code and `Server` response header.
pub struct DirectProbe {
    client: Client,
    port: u16,
}

impl DirectProbe {
    pub fn new(port: u16, timeout: Duration) -> Result<Self, BugscanError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(DirectProbe { client, port })
    }

    pub async fn probe(&self, address: &str) -> DirectResult {
        let url = target_url(address, self.port);
        match self.client.head(&url).send().await {
            Ok(response) => DirectResult {
                status_code: Some(response.status().as_u16()),
                // absent header is recorded as an empty string, not a miss
                server: Some(
                    response
                        .headers()
                        .get("server")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("")
                        .to_string(),
                ),
            },
            Err(err) => {
                debug!("HEAD {} failed: {}", url, err);
                DirectResult {
                    status_code: None,
                    server: None,
                }
            }
        }
    }
}
