use crate::config::Config;
use crate::query::Query;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

/// Why a page request failed. Any of these ends pagination for the current target.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Http(#[from] ureq::Error),
    #[error("could not parse API response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("API returned code {code}: {message}")]
    Api { code: i64, message: String },
}

/// Top-level response envelope.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchData {
    #[serde(default, deserialize_with = "loose_count")]
    pub total: u64,
    #[serde(default)]
    pub arr: Option<Vec<Asset>>,
}

/// One web asset. Only the fields the lookups read are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Asset {
    #[serde(default, deserialize_with = "loose_text")]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub web_title: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub number: Option<String>,
    /// Older responses nest the record as `{ name, number }`; kept loose since
    /// some assets carry a non-object value here.
    #[serde(default)]
    pub icp: Option<Value>,
    #[serde(default)]
    pub icp_info: Option<Value>,
}

/// Text field that may arrive as a number, null or something else entirely.
fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Result count; a null or malformed total reads as 0, which ends pagination.
fn loose_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// One successfully fetched page.
#[derive(Debug, Default)]
pub struct SearchPage {
    pub total: u64,
    pub assets: Vec<Asset>,
}

impl SearchResponse {
    /// Turn the envelope into a page, treating any non-200 code as an error.
    pub fn into_page(self) -> Result<SearchPage, SearchError> {
        if self.code != 200 {
            return Err(SearchError::Api {
                code: self.code,
                message: self.message.unwrap_or_else(|| "unknown error".into()),
            });
        }
        let data = self.data.unwrap_or_default();
        Ok(SearchPage {
            total: data.total,
            assets: data.arr.unwrap_or_default(),
        })
    }
}

/// Parse a raw response body.
pub fn parse_page(body: &str) -> Result<SearchPage, SearchError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    response.into_page()
}

/// Source of search result pages.
pub trait SearchApi {
    /// Fetch 1-based `page` of results for `query`.
    fn fetch_page(&self, query: &Query, page: u32) -> Result<SearchPage, SearchError>;
}

/// Blocking client for the Hunter search endpoint.
pub struct HunterClient {
    agent: ureq::Agent,
    api_url: String,
    api_key: String,
    page_size: u32,
}

impl HunterClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.request_timeout))
            .build()
            .new_agent();
        Self {
            agent,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            page_size: config.page_size,
        }
    }

    fn params(&self, query: &Query, page: u32) -> [(&'static str, String); 5] {
        [
            ("api-key", self.api_key.clone()),
            ("search", query.encoded()),
            ("page", page.to_string()),
            ("page_size", self.page_size.to_string()),
            // Web assets only.
            ("is_web", "1".to_string()),
        ]
    }

    /// Request URL for logs, with the key masked.
    fn display_url(&self, query: &Query, page: u32) -> String {
        let params: Vec<String> = self
            .params(query, page)
            .into_iter()
            .map(|(k, v)| if k == "api-key" { format!("{}=***", k) } else { format!("{}={}", k, v) })
            .collect();
        format!("{}?{}", self.api_url, params.join("&"))
    }
}

impl SearchApi for HunterClient {
    fn fetch_page(&self, query: &Query, page: u32) -> Result<SearchPage, SearchError> {
        debug!("GET {}", self.display_url(query, page));

        let mut request = self
            .agent
            .get(&self.api_url)
            .header("Content-Type", "application/x-www-form-urlencoded");
        for (key, value) in self.params(query, page) {
            request = request.query(key, value);
        }

        let mut resp = request.call()?;
        let body = resp.body_mut().read_to_string()?;
        trace!(bytes = body.len(), "response body received");

        let parsed = parse_page(&body)?;
        debug!(total = parsed.total, assets = parsed.assets.len(), "page decoded");
        Ok(parsed)
    }
}
