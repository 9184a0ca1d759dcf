//! TV QR-code login.
//!
//! The TV endpoints are app-key signed and report the login status in the
//! top-level envelope code. A completed login carries the cookies directly,
//! so no redirect URL is involved.

use super::{resolve_phase, LoginPhase, QrLoginEvent, QrLoginFlow, QrSession, TV_STATUS_TABLE};
use crate::client::{unix_timestamp, ApiClient};
use crate::credential::Credential;
use crate::error::{BiliError, Result};
use crate::models::{ApiResponse, TvLoginData, TvQrGenerateData};
use crate::sign::{sign_app_params, TV_APPKEY, TV_APPSEC};
use async_trait::async_trait;

const TV_REFERER: &str = "https://www.bilibili.com";

/// Build a credential from a completed TV login.
///
/// SESSDATA, bili_jct and DedeUserID come from `cookie_info`, the refresh
/// token becomes `ac_time_value`, other cookies are kept as extras.
pub fn credential_from_tv_login(data: &TvLoginData) -> Credential {
    let mut builder = Credential::builder();
    for cookie in &data.cookie_info.cookies {
        builder = match cookie.name.as_str() {
            "SESSDATA" => builder.sessdata(cookie.value.as_str()),
            "bili_jct" => builder.bili_jct(cookie.value.as_str()),
            "DedeUserID" => builder.dedeuserid(cookie.value.as_str()),
            _ => builder.extra(cookie.name.as_str(), cookie.value.as_str()),
        };
    }
    if !data.refresh_token.is_empty() {
        builder = builder.ac_time_value(data.refresh_token.as_str());
    }
    builder.build()
}

/// QR login through the TV passport.
#[derive(Clone)]
pub struct TvQrLogin {
    client: ApiClient,
}

impl TvQrLogin {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn signed_form(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.push(("local_id".to_string(), "0".to_string()));
        params.push(("ts".to_string(), unix_timestamp().to_string()));
        sign_app_params(&mut params, TV_APPKEY, TV_APPSEC);
        params
    }

    /// TV endpoints expect some buvid3; a random one is accepted.
    fn device_cookie() -> String {
        format!("buvid3={}infoc", uuid::Uuid::new_v4())
    }
}

#[async_trait]
impl QrLoginFlow for TvQrLogin {
    async fn generate(&self) -> Result<QrSession> {
        let resp: ApiResponse<TvQrGenerateData> = self
            .client
            .post_form(
                &self.client.passport_url("x/passport-tv-login/qrcode/auth_code"),
                &self.signed_form(&[]),
                TV_REFERER,
                Some(&Self::device_cookie()),
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
            .ok_or_else(|| BiliError::Protocol("TV auth code response has no data".into()))?;
        tracing::debug!("Generated TV QR code: auth_code={}", data.auth_code);

        Ok(QrSession {
            url: data.url,
            key: data.auth_code,
        })
    }

    async fn poll(&self, auth_code: &str) -> Result<QrLoginEvent> {
        let resp: ApiResponse<serde_json::Value> = self
            .client
            .post_form(
                &self.client.passport_url("x/passport-tv-login/qrcode/poll"),
                &self.signed_form(&[("auth_code", auth_code)]),
                TV_REFERER,
                Some(&Self::device_cookie()),
            )
            .await?;

        let phase = resolve_phase(TV_STATUS_TABLE, resp.code, &resp.message)?;
        tracing::debug!("TV QR poll: code={}, phase={}", resp.code, phase);

        if phase == LoginPhase::Complete {
            let data = resp
                .data
                .ok_or_else(|| BiliError::Protocol("TV login response has no data".into()))?;
            let data: TvLoginData = serde_json::from_value(data)
                .map_err(|e| BiliError::Protocol(format!("unexpected TV login data: {}", e)))?;
            tracing::info!("TV QR login complete for mid={}", data.mid);
            return Ok(QrLoginEvent::Complete(credential_from_tv_login(&data)));
        }

        QrLoginEvent::with_message(phase, resp.message)
            .ok_or_else(|| BiliError::Protocol(format!("no event for phase {}", phase)))
    }
}
