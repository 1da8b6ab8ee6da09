use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::Url;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::instrument;

use crate::models::Category;
use crate::models::Match;
use crate::models::Sport;
use crate::models::Stream;

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("catalog request failed: {0}")]
  Transport(#[source] reqwest::Error),
  #[error("catalog returned status {0}")]
  Status(StatusCode),
  #[error("catalog payload could not be decoded: {0}")]
  Decode(#[source] reqwest::Error),
  #[error("Stream not found")]
  NotFound,
}

/// Read access to the match and stream catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
  async fn fetch_matches(&self, sport: Sport, mode: Category) -> Result<Vec<Match>, CatalogError>;

  async fn fetch_stream(&self, source: &str, id: &str) -> Result<Stream, CatalogError>;

  /// Absolute URL of a poster given its catalog-relative path.
  fn poster_url(&self, path: &str) -> String;
}

#[derive(Clone)]
pub struct HttpCatalog {
  client: reqwest::Client,
  origin: String,
  base: Url,
}

impl HttpCatalog {
  pub fn new(origin: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
    let origin = origin.into();
    let base = Url::parse(&origin).with_context(|| format!("catalog origin {origin:?} is not a URL"))?;
    if base.cannot_be_a_base() {
      anyhow::bail!("catalog origin {origin:?} cannot carry a path");
    }
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, origin, base })
  }

  fn matches_url(&self, sport: Sport, mode: Category) -> String {
    match mode {
      Category::All => format!("{}/api/matches/{}", self.origin, sport),
      Category::Popular => format!("{}/api/matches/{}/popular", self.origin, sport),
      // the live listing is not scoped by sport upstream
      Category::Live => format!("{}/api/matches/live", self.origin),
    }
  }

  /// Each part is pushed as a single encoded segment; dot segments are rejected.
  fn stream_url(&self, source: &str, id: &str) -> Option<Url> {
    if [source, id].iter().any(|part| matches!(*part, "" | "." | "..")) {
      return None;
    }
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .ok()?
      .pop_if_empty()
      .extend(["api", "stream", source, id]);
    Some(url)
  }

  async fn get_list<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, CatalogError> {
    let response = self.client.get(url).send().await.map_err(CatalogError::Transport)?;
    let status = response.status();
    if !status.is_success() {
      return Err(CatalogError::Status(status));
    }
    let items: Option<Vec<T>> = response.json().await.map_err(CatalogError::Decode)?;
    Ok(items.unwrap_or_default())
  }
}

#[async_trait]
impl Catalog for HttpCatalog {
  #[instrument(skip(self))]
  async fn fetch_matches(&self, sport: Sport, mode: Category) -> Result<Vec<Match>, CatalogError> {
    let url = self.matches_url(sport, mode);
    match self.get_list::<Match>(&url).await {
      Ok(matches) => {
        let fetched = matches.len();
        let filtered = retain_sport(matches, sport);
        info!(%sport, ?mode, fetched, kept = filtered.len(), "fetched matches");
        Ok(filtered)
      },
      Err(err) => {
        error!(error = %err, %sport, ?mode, url = %url, "failed to fetch matches");
        Err(err)
      },
    }
  }

  #[instrument(skip(self))]
  async fn fetch_stream(&self, source: &str, id: &str) -> Result<Stream, CatalogError> {
    let Some(url) = self.stream_url(source, id) else {
      info!(source, id, "stream path rejected");
      return Err(CatalogError::NotFound);
    };
    let result = self
      .get_list::<Stream>(url.as_str())
      .await
      .and_then(|streams| streams.into_iter().next().ok_or(CatalogError::NotFound));
    match &result {
      Ok(stream) => info!(source, id, stream_no = stream.stream_no, "resolved stream"),
      Err(err) => error!(error = %err, source, id, "failed to resolve stream"),
    }
    result
  }

  fn poster_url(&self, path: &str) -> String {
    format!("{}{}", self.origin, path)
  }
}

pub fn retain_sport(matches: Vec<Match>, sport: Sport) -> Vec<Match> {
  matches.into_iter().filter(|m| m.is_sport(sport)).collect()
}
