//! Wire models for the passport and main API hosts.
//!
//! Field names follow the upstream JSON exactly.

use serde::{Deserialize, Serialize};

/// Standard `{code, message, data}` envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Response data from the web QR generate endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WebQrGenerateData {
    pub url: String,
    pub qrcode_key: String,
}

/// Response data from the web QR poll endpoint.
///
/// `code` here is the login status, not the envelope code.
#[derive(Debug, Clone, Deserialize)]
pub struct WebQrPollData {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// Response data from the TV auth-code endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TvQrGenerateData {
    pub url: String,
    pub auth_code: String,
}

/// Response data from a successful TV poll.
#[derive(Debug, Clone, Deserialize)]
pub struct TvLoginData {
    #[serde(default)]
    pub mid: i64,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub cookie_info: CookieInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieInfo {
    #[serde(default)]
    pub cookies: Vec<CookieEntry>,
    #[serde(default)]
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieEntry {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub http_only: i64,
    #[serde(default)]
    pub expires: i64,
}

/// Response data from `x/web-interface/nav`.
#[derive(Debug, Clone, Deserialize)]
pub struct NavData {
    #[serde(rename = "isLogin", default)]
    pub is_login: bool,
    #[serde(default)]
    pub mid: i64,
    #[serde(default)]
    pub uname: String,
    pub wbi_img: Option<WbiImg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbiImg {
    pub img_url: String,
    pub sub_url: String,
}

/// Login captcha data (`x/passport-login/captcha`).
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCaptchaData {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub token: String,
    pub geetest: GeetestChallengeData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeetestChallengeData {
    pub gt: String,
    pub challenge: String,
}

/// Safecenter captcha data (`x/safecenter/captcha/pre`).
#[derive(Debug, Clone, Deserialize)]
pub struct SafeCenterCaptchaData {
    #[serde(default)]
    pub recaptcha_type: String,
    pub gee_gt: String,
    pub gee_challenge: String,
    pub recaptcha_token: String,
}

/// Response data from the country list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryListData {
    #[serde(default)]
    pub common: Vec<Country>,
    #[serde(default)]
    pub others: Vec<Country>,
}

/// A dialing-code entry used by SMS login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub cname: String,
    pub country_id: String,
}
