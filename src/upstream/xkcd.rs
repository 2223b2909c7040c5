use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ComicgrepError, Result};
use crate::types::XkcdInfo;

use super::ComicSource;

const INFO_SUFFIX: &str = "info.0.json";

/// HTTP client for the xkcd-style comic archive.
///
/// `GET <base>/<id>/info.0.json` fetches one comic, `GET <base>/info.0.json`
/// the latest. A per-request timeout comes from configuration.
pub struct XkcdClient {
    client: reqwest::Client,
    base_url: String,
}

/// The subset of the upstream payload the engine consumes.
#[derive(Debug, Deserialize)]
struct RawComic {
    num: u32,
    img: String,
    title: String,
    alt: String,
    safe_title: String,
    #[serde(default)]
    transcript: String,
}

impl From<RawComic> for XkcdInfo {
    fn from(raw: RawComic) -> Self {
        XkcdInfo {
            id: raw.num,
            url: raw.img,
            title: raw.title,
            description: raw.alt,
            safe_title: raw.safe_title,
            transcript: raw.transcript,
        }
    }
}

impl XkcdClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if base_url.is_empty() {
            return Err(ComicgrepError::Config("empty upstream base url".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ComicgrepError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url, "fetching upstream");
        Ok(self.client.get(url).send().await?)
    }
}

#[async_trait]
impl ComicSource for XkcdClient {
    async fn last_id(&self) -> Result<u32> {
        let url = format!("{}/{INFO_SUFFIX}", self.base_url);
        let response = self.fetch(&url).await?;
        if !response.status().is_success() {
            return Err(ComicgrepError::Upstream(format!(
                "latest comic request returned status {}",
                response.status()
            )));
        }
        let raw: RawComic = response.json().await?;
        debug!(last_id = raw.num, "latest comic id");
        Ok(raw.num)
    }

    async fn get(&self, id: u32) -> Result<XkcdInfo> {
        let url = format!("{}/{id}/{INFO_SUFFIX}", self.base_url);
        let response = self.fetch(&url).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ComicgrepError::NotFound { id });
        }
        if !response.status().is_success() {
            return Err(ComicgrepError::Upstream(format!(
                "comic {id} request returned status {}",
                response.status()
            )));
        }

        let raw: RawComic = response.json().await?;
        Ok(raw.into())
    }
}
