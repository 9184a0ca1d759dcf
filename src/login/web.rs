//! Web QR-code login.

use super::{resolve_phase, LoginPhase, QrLoginEvent, QrLoginFlow, QrSession, WEB_STATUS_TABLE};
use crate::client::ApiClient;
use crate::credential::Credential;
use crate::error::{BiliError, Result};
use crate::models::{ApiResponse, WebQrGenerateData, WebQrPollData};
use async_trait::async_trait;

const LOGIN_REFERER: &str = "https://passport.bilibili.com/login";

/// `segment[start..]` when `segment` begins with `prefix`.
fn value_after<'a>(segment: &'a str, prefix: &str, start: usize, ignore_case: bool) -> Option<&'a str> {
    let head = segment.get(..prefix.len())?;
    let matched = if ignore_case {
        head.eq_ignore_ascii_case(prefix)
    } else {
        head == prefix
    };
    matched.then(|| segment.get(start..).unwrap_or(""))
}

/// Build a credential from the redirect URL the web poll returns on success.
///
/// The query carries `SESSDATA`, `bili_jct` and `DedeUserID` (case-insensitive)
/// in any order among other parameters. Missing ones come back as empty
/// strings; a URL with no `?` is a [`BiliError::Protocol`] error.
pub fn credential_from_redirect_url(url: &str) -> Result<Credential> {
    let query = url
        .split('?')
        .nth(1)
        .ok_or_else(|| BiliError::Protocol(format!("redirect URL has no query: {}", url)))?;

    let mut sessdata = "";
    let mut bili_jct = "";
    let mut dedeuserid = "";

    for segment in query.split('&') {
        if let Some(value) = value_after(segment, "SESSDATA", 9, false) {
            sessdata = value;
        }
        if let Some(value) = value_after(segment, "bili_jct", 9, false) {
            bili_jct = value;
        }
        // matching includes the '=' so DedeUserID__ckMd5 is skipped
        if let Some(value) = value_after(segment, "DedeUserID=", 11, true) {
            dedeuserid = value;
        }
    }

    Ok(Credential::builder()
        .sessdata(sessdata)
        .bili_jct(bili_jct)
        .dedeuserid(dedeuserid)
        .build())
}

/// QR login through the web passport.
#[derive(Clone)]
pub struct WebQrLogin {
    client: ApiClient,
}

impl WebQrLogin {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QrLoginFlow for WebQrLogin {
    async fn generate(&self) -> Result<QrSession> {
        let resp: ApiResponse<WebQrGenerateData> = self
            .client
            .get_json(
                &self.client.passport_url("x/passport-login/web/qrcode/generate"),
                &[("source".to_string(), "main-fe-header".to_string())],
                LOGIN_REFERER,
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
            .ok_or_else(|| BiliError::Protocol("QR generate response has no data".into()))?;
        tracing::debug!("Generated web QR code: key={}", data.qrcode_key);

        Ok(QrSession {
            url: data.url,
            key: data.qrcode_key,
        })
    }

    async fn poll(&self, key: &str) -> Result<QrLoginEvent> {
        let resp: ApiResponse<WebQrPollData> = self
            .client
            .get_json(
                &self.client.passport_url("x/passport-login/web/qrcode/poll"),
                &[("qrcode_key".to_string(), key.to_string())],
                LOGIN_REFERER,
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
            .ok_or_else(|| BiliError::Protocol("QR poll response has no data".into()))?;
        let phase = resolve_phase(WEB_STATUS_TABLE, data.code, &data.message)?;
        tracing::debug!("Web QR poll: code={}, phase={}", data.code, phase);

        if phase == LoginPhase::Complete {
            let credential = credential_from_redirect_url(&data.url)?;
            tracing::info!(
                "Web QR login complete for DedeUserID={}",
                credential.dedeuserid().unwrap_or_default()
            );
            return Ok(QrLoginEvent::Complete(credential));
        }

        QrLoginEvent::with_message(phase, data.message)
            .ok_or_else(|| BiliError::Protocol(format!("no event for phase {}", phase)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Endpoints;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_all_fields() {
        let url = "https://passport.biligame.com/crossDomain?SESSDATA=abc&bili_jct=def&DedeUserID=123";
        let credential = credential_from_redirect_url(url).unwrap();
        assert_eq!(credential.sessdata(), Some("abc"));
        assert_eq!(credential.bili_jct(), Some("def"));
        assert_eq!(credential.dedeuserid(), Some("123"));
    }

    #[test]
    fn test_extract_is_order_independent() {
        let url = "https://passport.biligame.com/crossDomain?DedeUserID=123&DedeUserID__ckMd5=ff&Expires=1&bili_jct=def&gourl=https%3A%2F%2Fwww.bilibili.com&SESSDATA=a%2C1%2Cb";
        let credential = credential_from_redirect_url(url).unwrap();
        assert_eq!(credential.sessdata(), Some("a%2C1%2Cb"));
        assert_eq!(credential.bili_jct(), Some("def"));
        assert_eq!(credential.dedeuserid(), Some("123"));
    }

    #[test]
    fn test_extract_dedeuserid_case_insensitive() {
        let url = "https://x?dedeuserid=42&SESSDATA=s";
        let credential = credential_from_redirect_url(url).unwrap();
        assert_eq!(credential.dedeuserid(), Some("42"));
    }

    #[test]
    fn test_extract_missing_field_is_empty() {
        let url = "https://x?SESSDATA=abc&DedeUserID=123";
        let credential = credential_from_redirect_url(url).unwrap();
        assert_eq!(credential.bili_jct(), Some(""));
        assert!(!credential.get_cookies().is_empty());
    }

    #[test]
    fn test_extract_without_query_fails() {
        let err = credential_from_redirect_url("https://passport.biligame.com/crossDomain").unwrap_err();
        assert!(matches!(err, BiliError::Protocol(_)));
    }

    async fn mock_login(server: &MockServer) -> WebQrLogin {
        let client = ApiClient::builder()
            .endpoints(Endpoints::single(server.uri()))
            .build()
            .unwrap();
        WebQrLogin::new(client)
    }

    async fn mount_poll(server: &MockServer, key: &str, data: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/x/passport-login/web/qrcode/poll"))
            .and(query_param("qrcode_key", key))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "message": "0",
                "ttl": 1,
                "data": data
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_generate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/passport-login/web/qrcode/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "message": "0",
                "data": {
                    "url": "https://account.bilibili.com/h5/account-h5/auth/scan-web?qrcode_key=k1",
                    "qrcode_key": "k1"
                }
            })))
            .mount(&server)
            .await;

        let session = mock_login(&server).await.generate().await.unwrap();
        assert_eq!(session.key, "k1");
        assert!(session.url.ends_with("qrcode_key=k1"));
    }

    #[tokio::test]
    async fn test_poll_phases() {
        let server = MockServer::start().await;
        let empty = |code: i64, message: &str| {
            json!({"url": "", "refresh_token": "", "timestamp": 0, "code": code, "message": message})
        };
        mount_poll(&server, "scan", empty(86101, "未扫码")).await;
        mount_poll(&server, "conf", empty(86090, "二维码已扫码未确认")).await;
        mount_poll(&server, "gone", empty(86038, "二维码已失效")).await;
        mount_poll(&server, "odd", empty(86000, "奇怪的状态")).await;
        mount_poll(
            &server,
            "done",
            json!({
                "url": "https://passport.biligame.com/crossDomain?DedeUserID=123&DedeUserID__ckMd5=ff&Expires=15551000&SESSDATA=abc&bili_jct=def&gourl=https%3A%2F%2Fwww.bilibili.com",
                "refresh_token": "rt",
                "timestamp": 1700000000000i64,
                "code": 0,
                "message": ""
            }),
        )
        .await;

        let login = mock_login(&server).await;

        let event = login.poll("scan").await.unwrap();
        assert_eq!(event, QrLoginEvent::AwaitingScan("未扫码".into()));

        let event = login.poll("conf").await.unwrap();
        assert_eq!(event.phase(), LoginPhase::AwaitingConfirm);

        let event = login.poll("gone").await.unwrap();
        assert_eq!(event, QrLoginEvent::Expired("二维码已失效".into()));

        match login.poll("odd").await.unwrap_err() {
            BiliError::Login { message } => assert_eq!(message, "奇怪的状态"),
            other => panic!("unexpected error: {other}"),
        }

        let credential = login.poll("done").await.unwrap().into_credential().unwrap();
        assert_eq!(credential.sessdata(), Some("abc"));
        assert_eq!(credential.bili_jct(), Some("def"));
        assert_eq!(credential.dedeuserid(), Some("123"));
        assert!(credential.has_bili_jct());
    }

    #[tokio::test]
    async fn test_poll_envelope_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/passport-login/web/qrcode/poll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": -400,
                "message": "请求错误"
            })))
            .mount(&server)
            .await;

        let err = mock_login(&server).await.poll("k").await.unwrap_err();
        assert!(matches!(err, BiliError::Api { code: -400, .. }));
    }
}
