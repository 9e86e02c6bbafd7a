use std::time::Duration;

use reqwest::Client;

use crate::config::SourceSettings;
use crate::error::FetchError;

/// Downloads the bank's rates document.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    url: String,
}

impl Fetcher {
    pub fn new(source: &SourceSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(source.timeout_secs))
            .user_agent(source.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            url: source.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the document body. Any non-success status is an error.
    pub async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body = resp.bytes().await?;
        Ok(body.to_vec())
    }
}
