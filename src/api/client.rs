use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::FetchError;
use super::model::{DocumentList, GraphData, KnowledgeStats, SeedResponse};

pub(super) const GRAPH_PATH: &str = "/api/graph/data";
pub(super) const STATS_PATH: &str = "/api/knowledge/stats";
pub(super) const DOCUMENTS_PATH: &str = "/api/documents";
pub(super) const SEED_PATH: &str = "/api/knowledge/seed";

/// Read and seed calls against the knowledge API.
pub trait GraphApi: Send + Sync {
    fn fetch_graph(&self) -> Result<GraphData, FetchError>;
    fn fetch_stats(&self) -> Result<KnowledgeStats, FetchError>;
    fn fetch_documents(&self) -> Result<DocumentList, FetchError>;
    fn seed(&self) -> Result<SeedResponse, FetchError>;
}

pub struct HttpGraphApi {
    base_url: String,
    client: Client,
}

impl HttpGraphApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        decode(url, response)
    }
}

impl GraphApi for HttpGraphApi {
    fn fetch_graph(&self) -> Result<GraphData, FetchError> {
        self.get_json(GRAPH_PATH)
    }

    fn fetch_stats(&self) -> Result<KnowledgeStats, FetchError> {
        self.get_json(STATS_PATH)
    }

    fn fetch_documents(&self) -> Result<DocumentList, FetchError> {
        self.get_json(DOCUMENTS_PATH)
    }

    fn seed(&self) -> Result<SeedResponse, FetchError> {
        let url = self.url(SEED_PATH);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        decode(url, response)
    }
}

fn decode<T: DeserializeOwned>(url: String, response: Response) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let body = response.text().map_err(|source| FetchError::Transport {
        url: url.clone(),
        source,
    })?;
    parse_body(&url, &body)
}

fn parse_body<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode {
        url: url.to_owned(),
        source,
    })
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
