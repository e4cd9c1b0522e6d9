//! Paged retrieval from the World Bank v2 API.
//!
//! Every collection endpoint answers with a two-element array
//! `[metadata, records]` where `metadata.pages` is the declared page count.
//! `Pager` walks pages `1..=pages` strictly in order, sleeping a fixed delay
//! before each follow-up request.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::PipelineConfig;
use crate::error::AppError;

/// Blocking JSON GET. Implemented over HTTP in production and faked in tests.
pub trait Transport {
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, AppError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, AppError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| AppError::new(4, format!("World Bank request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("World Bank request to {url} failed with status {}.", resp.status()),
            ));
        }

        resp.json()
            .map_err(|e| AppError::new(4, format!("Failed to parse World Bank response from {url}: {e}")))
    }
}

/// Walks the `[metadata, records]` page protocol for one base URL.
pub struct Pager<'a> {
    transport: &'a dyn Transport,
    base_url: String,
    page_size: usize,
    delay: Duration,
}

impl<'a> Pager<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: impl Into<String>, page_size: usize, delay: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size,
            delay,
        }
    }

    pub fn from_config(transport: &'a dyn Transport, config: &PipelineConfig) -> Self {
        Self::new(transport, config.base_url.clone(), config.page_size, config.request_delay)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Fetch every record of `endpoint`, concatenated in page order.
    ///
    /// A malformed first response yields an empty list; transport errors abort.
    pub fn fetch_all(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Value>, AppError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut query: Vec<(String, String)> = params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        query.push(("format".to_string(), "json".to_string()));
        query.push(("per_page".to_string(), self.page_size.to_string()));

        let first = self.transport.get_json(&url, &query)?;
        let Some((meta, records)) = split_page(first) else {
            warn!(endpoint, "malformed response, treating as empty");
            return Ok(Vec::new());
        };

        let pages = declared_pages(&meta);
        let mut all = records;
        debug!(endpoint, pages, first_page = all.len(), "fetched page 1");

        for page in 2..=pages {
            thread::sleep(self.delay);

            let mut paged = query.clone();
            paged.push(("page".to_string(), page.to_string()));
            let body = self.transport.get_json(&url, &paged)?;

            match split_page(body) {
                Some((_, records)) => {
                    debug!(endpoint, page, records = records.len(), "fetched page");
                    all.extend(records);
                }
                None => warn!(endpoint, page, "malformed page, skipping"),
            }
        }

        Ok(all)
    }
}

/// Split a page body into `(metadata, records)`; `None` if it is not the expected shape.
fn split_page(body: Value) -> Option<(Value, Vec<Value>)> {
    let Value::Array(mut items) = body else {
        return None;
    };
    if items.len() < 2 {
        return None;
    }
    let records = match items.swap_remove(1) {
        Value::Array(records) => records,
        _ => Vec::new(),
    };
    let meta = items.swap_remove(0);
    Some((meta, records))
}

/// `metadata.pages` arrives as a number or a numeric string; default 1.
fn declared_pages(meta: &Value) -> usize {
    let pages = match meta.get("pages") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    pages.map(|p| p as usize).unwrap_or(1).max(1)
}
