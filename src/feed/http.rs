//! Snapshot source backed by the tournament REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::info;
use url::Url;

use super::{SnapshotSource, TransportError};
use crate::models::{Tournament, TournamentId};

/// Configuration for [`HttpSnapshotSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// API root, e.g. `http://localhost:3001/api`
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("dojo-scoreboard/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches snapshots with `GET {base}/tournaments[/{id}]`.
pub struct HttpSnapshotSource {
    client: Client,
    base_url: Url,
}

impl HttpSnapshotSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("dojo-scoreboard")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url(&config.base_url)?,
        })
    }

    /// `{base}/tournaments[/{id}]` with the id escaped as one path segment.
    fn tournaments_url(&self, id: Option<&TournamentId>) -> Result<Url, TransportError> {
        if let Some(id) = id {
            if matches!(id.as_str(), "" | "." | "..") {
                return Err(TransportError::InvalidUrl(format!(
                    "Invalid tournament id {:?}",
                    id.as_str()
                )));
            }
        }

        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::InvalidUrl(format!("{} cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty().push("tournaments");
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        info!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

/// Parse the API root, making sure relative joins append to its path.
fn base_url(raw: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(raw).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, id: &TournamentId) -> Result<Tournament, TransportError> {
        let url = self.tournaments_url(Some(id))?;
        match self.get_json(url).await {
            Err(TransportError::HttpStatus { status: 404, .. }) => {
                Err(TransportError::NotFound(id.clone()))
            }
            other => other,
        }
    }

    async fn list(&self) -> Result<Vec<Tournament>, TransportError> {
        let url = self.tournaments_url(None)?;
        self.get_json(url).await
    }
}
