//! Client for the connpass event search API.
//!
//! A search turns a [`SearchCondition`] and a page position into one GET
//! request and maps the JSON reply into [`Event`] records. Nothing is cached
//! and nothing is retried; every call is independent.

mod query;
mod response;

#[cfg(test)]
pub(crate) mod testing;

use reqwest::Url;
use thiserror::Error;

use crate::config::SearchConfig;
use crate::models::{Event, SearchCondition, SearchPage};
use crate::transport::{HttpTransport, ReqwestTransport, TransportError};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("request build error: {0}")]
    RequestBuild(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

pub trait EventSearcher: Send + Sync {
    /// Fetches one page of events. `page` is 1-based and `count` is the page size.
    fn search(
        &self,
        condition: &SearchCondition,
        page: i64,
        count: i64,
    ) -> Result<Vec<Event>, SearchError>;
}

pub struct Searcher<T = ReqwestTransport> {
    endpoint: Url,
    transport: T,
    require_success_status: bool,
}

impl Searcher<ReqwestTransport> {
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let transport = ReqwestTransport::from_config(config)
            .map_err(|err| SearchError::Configuration(format!("http client: {err}")))?;
        Ok(Self::with_transport(&config.endpoint, transport)?
            .require_success_status(config.require_success_status))
    }
}

impl<T: HttpTransport> Searcher<T> {
    pub fn with_transport(endpoint: &str, transport: T) -> Result<Self, SearchError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            transport,
            require_success_status: false,
        })
    }

    /// When set, non-2xx replies fail with [`SearchError::Status`] instead of being decoded.
    pub fn require_success_status(mut self, required: bool) -> Self {
        self.require_success_status = required;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_url(
        &self,
        condition: &SearchCondition,
        page: i64,
        count: i64,
    ) -> Result<Url, SearchError> {
        query::build_url(&self.endpoint, condition, page, count)
    }

    pub fn search_page(
        &self,
        condition: &SearchCondition,
        page: i64,
        count: i64,
    ) -> Result<SearchPage, SearchError> {
        let url = self.build_url(condition, page, count)?;
        log::debug!("searching events: {url}");
        let response = self.transport.get(&url)?;
        let results = response::read_page(response, self.require_success_status)?;
        log::debug!(
            "received {} events ({} available)",
            results.events.len(),
            results.results_available
        );
        Ok(results)
    }
}

impl<T: HttpTransport> EventSearcher for Searcher<T> {
    fn search(
        &self,
        condition: &SearchCondition,
        page: i64,
        count: i64,
    ) -> Result<Vec<Event>, SearchError> {
        self.search_page(condition, page, count)
            .map(|results| results.events)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, SearchError> {
    let url = Url::parse(endpoint.trim())
        .map_err(|err| SearchError::Configuration(format!("invalid endpoint {endpoint:?}: {err}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(SearchError::Configuration(format!(
            "endpoint {endpoint:?} is not an http(s) URL"
        )));
    }
    Ok(url)
}
