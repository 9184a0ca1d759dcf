//! Error types for the bili-passport library.

use thiserror::Error;

/// Credential fields that an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Sessdata,
    BiliJct,
    Buvid3,
    DedeUserId,
    AcTimeValue,
}

impl CredentialField {
    /// Cookie name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialField::Sessdata => "SESSDATA",
            CredentialField::BiliJct => "bili_jct",
            CredentialField::Buvid3 => "buvid3",
            CredentialField::DedeUserId => "DedeUserID",
            CredentialField::AcTimeValue => "ac_time_value",
        }
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the bili-passport library.
#[derive(Error, Debug)]
pub enum BiliError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] rquest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Login endpoint reported a status this client does not know
    #[error("Login failed: {message}")]
    Login { message: String },

    /// Credential lacks a field the caller required
    #[error("Credential has no {0}")]
    MissingCredential(CredentialField),

    /// Upstream broke its wire contract (malformed redirect URL, missing data)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Non-zero code in the response envelope
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Geetest relay server failure
    #[error("Geetest relay error: {0}")]
    Geetest(String),
}

/// Result type alias for bili-passport operations.
pub type Result<T> = std::result::Result<T, BiliError>;
