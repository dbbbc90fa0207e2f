use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Catalog entry exposed by the external arena platform.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub rarity: Option<String>,
}

#[derive(Debug, Serialize)]
struct AckRequest<'a> {
    id: &'a str,
}

#[derive(Debug)]
pub enum PlatformError {
    Rejected,
    UpstreamUnavailable,
}

// Thin reqwest client for the external arena platform. All calls are
// fire-and-forget relative to match state; callers spawn and log failures.
#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlatformClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetches the purchasable item catalog, used for startup diagnostics.
    pub async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, PlatformError> {
        let url = format!("{}/catalog", self.base_url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|_| PlatformError::UpstreamUnavailable)?;

        if response.status().is_success() {
            return response
                .json::<Vec<CatalogEntry>>()
                .await
                .map_err(|_| PlatformError::UpstreamUnavailable);
        }
        Err(PlatformError::UpstreamUnavailable)
    }

    /// Confirms a delivered item drop back to the platform.
    pub async fn acknowledge_drop(&self, drop_id: &str) -> Result<(), PlatformError> {
        self.acknowledge("drops", drop_id).await
    }

    /// Confirms an applied viewer boost back to the platform.
    pub async fn acknowledge_boost(&self, boost_id: &str) -> Result<(), PlatformError> {
        self.acknowledge("boosts", boost_id).await
    }

    async fn acknowledge(&self, kind: &str, id: &str) -> Result<(), PlatformError> {
        let url = format!("{}/{kind}/ack", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&AckRequest { id })
            .send()
            .await
            .map_err(|_| PlatformError::UpstreamUnavailable)?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() == StatusCode::CONFLICT {
            // Already acknowledged; the platform retries deliveries.
            return Err(PlatformError::Rejected);
        }
        Err(PlatformError::UpstreamUnavailable)
    }
}
