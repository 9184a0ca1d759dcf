//! QR-code login.
//!
//! Both the web and the TV flow work the same way: [`QrLoginFlow::generate`]
//! returns a [`QrSession`] whose URL is shown to the user as a QR code, then the
//! caller calls [`QrLoginFlow::poll`] on its own schedule (about once a second,
//! the endpoint is rate limited) until a terminal [`LoginPhase`] comes back.
//! No loop, retry or timeout lives in here.
//!
//! ```ignore
//! use bili_passport::{ApiClient, QrLoginFlow, QrLoginEvent, WebQrLogin};
//!
//! let login = WebQrLogin::new(ApiClient::new()?);
//! let session = login.generate().await?;
//! println!("scan: {}", session.url);
//! loop {
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     match login.poll(&session.key).await? {
//!         QrLoginEvent::Complete(credential) => break,
//!         QrLoginEvent::Expired(_) => return Ok(()),
//!         _ => continue,
//!     }
//! }
//! ```

mod tv;
mod web;

pub use tv::{credential_from_tv_login, TvQrLogin};
pub use web::{credential_from_redirect_url, WebQrLogin};

use crate::client::ApiClient;
use crate::credential::Credential;
use crate::error::{BiliError, Result};
use crate::models::{Country, CountryListData};
use async_trait::async_trait;

/// Recommended delay between two polls.
pub const DEFAULT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Phase of a QR login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginPhase {
    /// QR code not scanned yet
    AwaitingScan,
    /// Scanned, waiting for the user to confirm on the phone
    AwaitingConfirm,
    /// QR code expired
    Expired,
    /// Logged in
    Complete,
}

impl LoginPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginPhase::AwaitingScan => "scan",
            LoginPhase::AwaitingConfirm => "confirm",
            LoginPhase::Expired => "timeout",
            LoginPhase::Complete => "done",
        }
    }

    /// No further polling makes sense after a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoginPhase::Expired | LoginPhase::Complete)
    }
}

impl std::fmt::Display for LoginPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upstream status code to phase table.
pub type StatusTable = [(i64, LoginPhase)];

/// Status codes of the web QR poll endpoint.
pub const WEB_STATUS_TABLE: &StatusTable = &[
    (86101, LoginPhase::AwaitingScan),
    (86090, LoginPhase::AwaitingConfirm),
    (86038, LoginPhase::Expired),
    (0, LoginPhase::Complete),
];

/// Status codes of the TV QR poll endpoint. The TV flow has no confirm step.
pub const TV_STATUS_TABLE: &StatusTable = &[
    (86039, LoginPhase::AwaitingScan),
    (86038, LoginPhase::Expired),
    (0, LoginPhase::Complete),
];

const fn codes_unique(table: &StatusTable) -> bool {
    let mut i = 0;
    while i < table.len() {
        let mut j = i + 1;
        while j < table.len() {
            if table[i].0 == table[j].0 {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(codes_unique(WEB_STATUS_TABLE));
const _: () = assert!(codes_unique(TV_STATUS_TABLE));

/// Look up the phase for an upstream status code.
pub fn phase_for_code(table: &StatusTable, code: i64) -> Option<LoginPhase> {
    table
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, phase)| *phase)
}

/// Map a code through `table`, failing with [`BiliError::Login`] on unknown codes.
pub(crate) fn resolve_phase(table: &StatusTable, code: i64, message: &str) -> Result<LoginPhase> {
    phase_for_code(table, code).ok_or_else(|| BiliError::Login {
        message: message.to_string(),
    })
}

/// Outcome of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrLoginEvent {
    AwaitingScan(String),
    AwaitingConfirm(String),
    Expired(String),
    Complete(Credential),
}

impl QrLoginEvent {
    pub(crate) fn with_message(phase: LoginPhase, message: String) -> Option<Self> {
        match phase {
            LoginPhase::AwaitingScan => Some(Self::AwaitingScan(message)),
            LoginPhase::AwaitingConfirm => Some(Self::AwaitingConfirm(message)),
            LoginPhase::Expired => Some(Self::Expired(message)),
            LoginPhase::Complete => None,
        }
    }

    pub fn phase(&self) -> LoginPhase {
        match self {
            QrLoginEvent::AwaitingScan(_) => LoginPhase::AwaitingScan,
            QrLoginEvent::AwaitingConfirm(_) => LoginPhase::AwaitingConfirm,
            QrLoginEvent::Expired(_) => LoginPhase::Expired,
            QrLoginEvent::Complete(_) => LoginPhase::Complete,
        }
    }

    /// Upstream message of a non-complete event.
    pub fn message(&self) -> Option<&str> {
        match self {
            QrLoginEvent::AwaitingScan(m)
            | QrLoginEvent::AwaitingConfirm(m)
            | QrLoginEvent::Expired(m) => Some(m),
            QrLoginEvent::Complete(_) => None,
        }
    }

    pub fn into_credential(self) -> Option<Credential> {
        match self {
            QrLoginEvent::Complete(credential) => Some(credential),
            _ => None,
        }
    }
}

/// A generated QR code: the content to render and the key to poll with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSession {
    /// URL to encode into the QR image
    pub url: String,
    /// Login key (web) or auth code (TV)
    pub key: String,
}

/// A QR login flow: one request per call, cadence owned by the caller.
#[async_trait]
pub trait QrLoginFlow: Send + Sync {
    /// Request a fresh QR code.
    async fn generate(&self) -> Result<QrSession>;

    /// Issue one status request for `key`.
    async fn poll(&self, key: &str) -> Result<QrLoginEvent>;
}

/// Dialing codes accepted by SMS login, common entries first.
pub async fn countries(client: &ApiClient) -> Result<Vec<Country>> {
    let resp: crate::models::ApiResponse<CountryListData> = client
        .get_json(
            &client.passport_url("web/generic/country/list"),
            &[],
            "https://passport.bilibili.com/login",
            None,
        )
        .await?;

    if resp.code != 0 {
        return Err(BiliError::Api {
            code: resp.code,
            message: resp.message,
        });
    }

    let data = resp
        .data
        .ok_or_else(|| BiliError::Protocol("country list has no data".into()))?;
    Ok(data.common.into_iter().chain(data.others).collect())
}
