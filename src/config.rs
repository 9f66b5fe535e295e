use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://hunter.qianxin.com/openApi/search";

/// Main configuration for a lookup run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hunter API key, sent as the `api-key` query parameter.
    pub api_key: String,
    /// Search endpoint.
    pub api_url: String,
    /// Results requested per page.
    pub page_size: u32,
    /// Hard cap on pages fetched per target.
    pub max_pages: u32,
    /// Pause between two page requests of the same target.
    pub delay: Duration,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Total attempts for a spreadsheet write that hits a permission error.
    pub write_attempts: u32,
    /// Pause between those attempts.
    pub write_retry_delay: Duration,
}

impl Config {
    /// Defaults matching the public Hunter quota: 100 results per page, 5 pages, 1s apart.
    pub fn hunter_defaults(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.into(),
            page_size: 100,
            max_pages: 5,
            delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            write_attempts: 3,
            write_retry_delay: Duration::from_secs(2),
        }
    }

    /// Reject settings that would make every request fail or never paginate.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("No Hunter API key configured: pass --api-key or set HUNTER_API_KEY");
        }
        if self.page_size == 0 {
            bail!("page size must be at least 1");
        }
        if self.max_pages == 0 {
            bail!("max pages must be at least 1");
        }
        if self.write_attempts == 0 {
            bail!("write attempts must be at least 1");
        }
        Ok(())
    }
}
