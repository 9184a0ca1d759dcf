//! # bili-passport
//!
//! A client for the bilibili passport: QR-code login, session credentials and
//! the geetest captcha relay.
//!
//! ## Features
//!
//! - **QR Login**: Web and TV QR-code flows behind one [`QrLoginFlow`] trait.
//!   Each poll is a single request; the caller decides how often to poll and
//!   when to give up.
//! - **Credentials**: [`Credential`] holds SESSDATA, bili_jct, buvid3,
//!   DedeUserID, ac_time_value and any extra cookies, with presence checks,
//!   cookie materialization and a remote validity check.
//! - **Request Signing**: App-key signatures for TV endpoints and WBI signing
//!   with automatic key refresh.
//! - **Geetest Relay**: A local page for solving captchas by hand, with an
//!   explicit start/stop lifecycle.
//! - **Proxy Support**: HTTP and SOCKS5 proxy support through `rquest`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use bili_passport::{ApiClient, QrLoginEvent, QrLoginFlow, WebQrLogin, DEFAULT_POLL_INTERVAL};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let login = WebQrLogin::new(ApiClient::new()?);
//!     let session = login.generate().await?;
//!     println!("Encode this as a QR code: {}", session.url);
//!
//!     let credential = loop {
//!         tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
//!         match login.poll(&session.key).await? {
//!             QrLoginEvent::Complete(credential) => break credential,
//!             QrLoginEvent::Expired(message) => anyhow::bail!(message),
//!             other => println!("{}", other.phase()),
//!         }
//!     };
//!
//!     credential.raise_for_no_bili_jct()?;
//!     println!("cookies: {}", credential.cookie_header());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod credential;
pub mod error;
pub mod geetest;
pub mod login;
pub mod models;
pub mod settings;
pub mod sign;
pub mod store;

// Re-exports for convenience
pub use client::{ApiClient, ApiClientBuilder};
pub use credential::{Credential, CredentialBuilder};
pub use error::{BiliError, CredentialField, Result};
pub use geetest::{GeetestKind, GeetestResult, GeetestServer, GeetestServerHandle};
pub use login::{
    countries, LoginPhase, QrLoginEvent, QrLoginFlow, QrSession, TvQrLogin, WebQrLogin,
    DEFAULT_POLL_INTERVAL,
};
pub use settings::{Endpoints, Settings};
pub use store::CredentialStore;
