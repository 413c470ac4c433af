use log::warn;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{PipetrendError, Result};

const MAX_RETRIES: u32 = 5;
const RETRY_DELAY_SECONDS: u64 = 10;
const MAX_CONCURRENT_REQUESTS: usize = 25;
pub(super) const PAGE_SIZE: usize = 100;

pub struct GitLabClient {
    pub(super) client: Client,
    pub(super) api_url: Url,
    semaphore: Arc<Semaphore>,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &token {
            let mut value = HeaderValue::from_str(token.as_str())
                .map_err(|e| PipetrendError::Config(format!("Invalid token: {e}")))?;
            value.set_sensitive(true);
            headers.insert("private-token", value);
        }

        let client = Client::builder()
            .user_agent(concat!("pipetrend/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| PipetrendError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base = Url::parse(base_url)
            .map_err(|e| PipetrendError::Config(format!("Invalid base URL: {e}")))?;

        let api_url = base
            .join("api/v4/")
            .map_err(|e| PipetrendError::Config(format!("Invalid API URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    /// Execute a GET request with automatic retry on network errors and rate
    /// limits, then decode the JSON body.
    pub(super) async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        // One permit per logical request caps concurrency across the client
        let _permit = self.semaphore.acquire().await.unwrap();

        let mut retry_count = 0;
        loop {
            let response = match self.client.get(url.clone()).send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    if retry_count >= MAX_RETRIES {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({}), retrying in {}s ({}/{})...",
                        e,
                        RETRY_DELAY_SECONDS,
                        retry_count + 1,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(PipetrendError::ApiAfterRetries {
                        status: status.as_u16(),
                        retries: MAX_RETRIES,
                    });
                }

                warn!(
                    "GitLab API error (status {status}). Waiting {RETRY_DELAY_SECONDS} seconds before retry {}/{}...",
                    retry_count + 1,
                    MAX_RETRIES
                );

                tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(PipetrendError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response.json().await?);
        }
    }
}
