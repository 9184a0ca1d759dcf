//! Client settings.
//!
//! Everything here is plain data handed to [`ApiClientBuilder`](crate::ApiClientBuilder)
//! once; nothing is read from globals at request time.

use std::net::IpAddr;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of re-signed attempts for WBI endpoints.
pub const DEFAULT_WBI_RETRY_TIMES: u32 = 3;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Base URLs of the hosts the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Passport host (login, captcha, country list)
    pub passport: String,
    /// Main API host (nav)
    pub api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            passport: "https://passport.bilibili.com".to_string(),
            api: "https://api.bilibili.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point both hosts at a single base URL, e.g. a local mock server.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            passport: base.clone(),
            api: base,
        }
    }

    pub(crate) fn passport_url(&self, path: &str) -> String {
        join(&self.passport, path)
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        join(&self.api, path)
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Settings shared by every request an [`ApiClient`](crate::ApiClient) makes.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// HTTP or SOCKS5 proxy URL.
    pub proxy: Option<String>,
    /// How many times a WBI-signed request is re-signed after a risk-control reply.
    pub wbi_retry_times: u32,
    /// Log every API call at `info` under the `request` target.
    pub request_log: bool,
    pub user_agent: String,
    /// Local address to bind outgoing connections to.
    pub local_address: Option<IpAddr>,
    pub endpoints: Endpoints,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            wbi_retry_times: DEFAULT_WBI_RETRY_TIMES,
            request_log: false,
            user_agent: USER_AGENT.to_string(),
            local_address: None,
            endpoints: Endpoints::default(),
        }
    }
}
