use super::traits::ListDownloader;
use crate::error::FetchError;
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// `timeout` bounds each individual request, not a whole refresh pass.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ad-sentry/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ListDownloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
