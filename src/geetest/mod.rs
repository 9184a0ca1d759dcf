//! Geetest captcha bridging.
//!
//! Some passport actions (SMS login, risk verification) need a solved geetest
//! v3 challenge. The challenge has to be solved by a human in a browser, so
//! [`GeetestServer`] serves a local page running the widget and collects the
//! result. The relay shares nothing with the QR pollers.

mod server;

pub use server::{GeetestServer, GeetestServerHandle};

use crate::client::ApiClient;
use crate::error::{BiliError, Result};
use crate::models::{ApiResponse, LoginCaptchaData, SafeCenterCaptchaData};
use serde::{Deserialize, Serialize};

/// Which passport flow the captcha is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeetestKind {
    /// Password / SMS login
    Login,
    /// Safecenter risk verification after a suspicious login
    SafeCenter,
}

impl GeetestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeetestKind::Login => "login",
            GeetestKind::SafeCenter => "safecenter",
        }
    }
}

impl std::fmt::Display for GeetestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A geetest v3 challenge issued by the passport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeetestChallenge {
    pub gt: String,
    pub challenge: String,
    /// Passport token the solved captcha is bound to
    pub token: String,
}

/// A solved challenge, ready to be sent with the protected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeetestResult {
    pub gt: String,
    pub challenge: String,
    pub validate: String,
    pub seccode: String,
    pub token: String,
}

/// Ask the passport for a fresh challenge.
pub async fn fetch_challenge(client: &ApiClient, kind: GeetestKind) -> Result<GeetestChallenge> {
    match kind {
        GeetestKind::Login => {
            let resp: ApiResponse<LoginCaptchaData> = client
                .get_json(
                    &client.passport_url("x/passport-login/captcha"),
                    &[("source".to_string(), "main_web".to_string())],
                    "https://passport.bilibili.com/login",
                    None,
                )
                .await?;
            let data = envelope_data(resp, kind)?;
            Ok(GeetestChallenge {
                gt: data.geetest.gt,
                challenge: data.geetest.challenge,
                token: data.token,
            })
        }
        GeetestKind::SafeCenter => {
            let resp: ApiResponse<SafeCenterCaptchaData> = client
                .post_form(
                    &client.passport_url("x/safecenter/captcha/pre"),
                    &[],
                    "https://passport.bilibili.com/",
                    None,
                )
                .await?;
            let data = envelope_data(resp, kind)?;
            Ok(GeetestChallenge {
                gt: data.gee_gt,
                challenge: data.gee_challenge,
                token: data.recaptcha_token,
            })
        }
    }
}

fn envelope_data<T>(resp: ApiResponse<T>, kind: GeetestKind) -> Result<T> {
    if resp.code != 0 {
        return Err(BiliError::Api {
            code: resp.code,
            message: resp.message,
        });
    }
    resp.data
        .ok_or_else(|| BiliError::Protocol(format!("{} captcha response has no data", kind)))
}
