//! Session credential used to authenticate API calls.

use crate::client::ApiClient;
use crate::error::{BiliError, CredentialField, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Percent-encode a SESSDATA value unless it already carries an escape.
///
/// Encoded output either contains `%` or only unreserved characters, so
/// applying this twice is the same as applying it once.
pub fn encode_sessdata(raw: &str) -> String {
    if raw.contains('%') {
        return raw.to_string();
    }
    urlencoding::encode(raw).replace("%2F", "/")
}

/// Login credential: the typed cookie fields plus any extra cookies.
///
/// Build one with [`Credential::builder`]. The value is immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CredentialRecord")]
pub struct Credential {
    sessdata: Option<String>,
    bili_jct: Option<String>,
    buvid3: Option<String>,
    dedeuserid: Option<String>,
    ac_time_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extra: Vec<(String, String)>,
}

/// Serialized shape of a credential; deserialization goes back through the builder.
#[derive(Deserialize)]
struct CredentialRecord {
    sessdata: Option<String>,
    bili_jct: Option<String>,
    buvid3: Option<String>,
    dedeuserid: Option<String>,
    ac_time_value: Option<String>,
    #[serde(default)]
    extra: Vec<(String, String)>,
}

impl From<CredentialRecord> for Credential {
    fn from(record: CredentialRecord) -> Self {
        let mut builder = CredentialBuilder {
            sessdata: record.sessdata,
            bili_jct: record.bili_jct,
            buvid3: record.buvid3,
            dedeuserid: record.dedeuserid,
            ac_time_value: record.ac_time_value,
            extra: Vec::new(),
        };
        for (key, value) in record.extra {
            builder = builder.extra(key, value);
        }
        builder.build()
    }
}

/// Builder for [`Credential`].
#[derive(Debug, Clone, Default)]
pub struct CredentialBuilder {
    sessdata: Option<String>,
    bili_jct: Option<String>,
    buvid3: Option<String>,
    dedeuserid: Option<String>,
    ac_time_value: Option<String>,
    extra: Vec<(String, String)>,
}

impl CredentialBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set SESSDATA. Raw values are percent-encoded on build.
    pub fn sessdata(mut self, value: impl Into<String>) -> Self {
        self.sessdata = Some(value.into());
        self
    }

    /// Set bili_jct (the CSRF token).
    pub fn bili_jct(mut self, value: impl Into<String>) -> Self {
        self.bili_jct = Some(value.into());
        self
    }

    pub fn buvid3(mut self, value: impl Into<String>) -> Self {
        self.buvid3 = Some(value.into());
        self
    }

    pub fn dedeuserid(mut self, value: impl Into<String>) -> Self {
        self.dedeuserid = Some(value.into());
        self
    }

    /// Set ac_time_value (the refresh token).
    pub fn ac_time_value(mut self, value: impl Into<String>) -> Self {
        self.ac_time_value = Some(value.into());
        self
    }

    /// Add an extra cookie. A later value for the same key replaces the earlier one.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.extra.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.extra.push((key, value)),
        }
        self
    }

    pub fn build(self) -> Credential {
        Credential {
            sessdata: self.sessdata.as_deref().map(encode_sessdata),
            bili_jct: self.bili_jct,
            buvid3: self.buvid3,
            dedeuserid: self.dedeuserid,
            ac_time_value: self.ac_time_value,
            extra: self.extra,
        }
    }
}

impl Credential {
    pub fn builder() -> CredentialBuilder {
        CredentialBuilder::new()
    }

    pub fn sessdata(&self) -> Option<&str> {
        self.sessdata.as_deref()
    }

    pub fn bili_jct(&self) -> Option<&str> {
        self.bili_jct.as_deref()
    }

    pub fn buvid3(&self) -> Option<&str> {
        self.buvid3.as_deref()
    }

    pub fn dedeuserid(&self) -> Option<&str> {
        self.dedeuserid.as_deref()
    }

    pub fn ac_time_value(&self) -> Option<&str> {
        self.ac_time_value.as_deref()
    }

    /// Extra cookies in insertion order.
    pub fn extra(&self) -> &[(String, String)] {
        &self.extra
    }

    fn field(&self, field: CredentialField) -> Option<&str> {
        match field {
            CredentialField::Sessdata => self.sessdata(),
            CredentialField::BiliJct => self.bili_jct(),
            CredentialField::Buvid3 => self.buvid3(),
            CredentialField::DedeUserId => self.dedeuserid(),
            CredentialField::AcTimeValue => self.ac_time_value(),
        }
    }

    /// Whether `field` is present.
    ///
    /// Every field other than SESSDATA additionally requires a non-empty
    /// SESSDATA: with no session, a lone bili_jct counts as absent.
    pub fn has(&self, field: CredentialField) -> bool {
        let has_session = matches!(self.sessdata(), Some(s) if !s.is_empty());
        match field {
            CredentialField::Sessdata => has_session,
            other => self.field(other).is_some() && has_session,
        }
    }

    /// Fail with [`BiliError::MissingCredential`] unless `field` is present.
    pub fn require(&self, field: CredentialField) -> Result<()> {
        if self.has(field) {
            Ok(())
        } else {
            Err(BiliError::MissingCredential(field))
        }
    }

    pub fn has_sessdata(&self) -> bool {
        self.has(CredentialField::Sessdata)
    }

    pub fn has_bili_jct(&self) -> bool {
        self.has(CredentialField::BiliJct)
    }

    pub fn has_buvid3(&self) -> bool {
        self.has(CredentialField::Buvid3)
    }

    pub fn has_dedeuserid(&self) -> bool {
        self.has(CredentialField::DedeUserId)
    }

    pub fn has_ac_time_value(&self) -> bool {
        self.has(CredentialField::AcTimeValue)
    }

    pub fn raise_for_no_sessdata(&self) -> Result<()> {
        self.require(CredentialField::Sessdata)
    }

    pub fn raise_for_no_bili_jct(&self) -> Result<()> {
        self.require(CredentialField::BiliJct)
    }

    pub fn raise_for_no_buvid3(&self) -> Result<()> {
        self.require(CredentialField::Buvid3)
    }

    pub fn raise_for_no_dedeuserid(&self) -> Result<()> {
        self.require(CredentialField::DedeUserId)
    }

    pub fn raise_for_no_ac_time_value(&self) -> Result<()> {
        self.require(CredentialField::AcTimeValue)
    }

    /// Cookies in request order: typed fields first, then extras that do not
    /// collide with a typed cookie.
    pub fn cookie_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = [
            (CredentialField::Sessdata, self.sessdata()),
            (CredentialField::Buvid3, self.buvid3()),
            (CredentialField::BiliJct, self.bili_jct()),
            (CredentialField::AcTimeValue, self.ac_time_value()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field.as_str().to_string(), v.to_string())))
        .collect();

        if let Some(uid) = self.dedeuserid().filter(|uid| !uid.is_empty()) {
            pairs.push((CredentialField::DedeUserId.as_str().to_string(), uid.to_string()));
        }

        for (key, value) in &self.extra {
            if !pairs.iter().any(|(k, _)| k == key) {
                pairs.push((key.clone(), value.clone()));
            }
        }
        pairs
    }

    /// Cookie name to value mapping for downstream requests.
    pub fn get_cookies(&self) -> HashMap<String, String> {
        self.cookie_pairs().into_iter().collect()
    }

    /// `Cookie` header value.
    pub fn cookie_header(&self) -> String {
        self.cookie_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Check whether the session is still logged in according to the nav endpoint.
    ///
    /// Returns `Ok(false)` when the service rejects the session (code -101).
    pub async fn check_valid(&self, client: &ApiClient) -> Result<bool> {
        let resp = client.nav(Some(self)).await?;
        match resp.code {
            0 => Ok(resp.data.map(|nav| nav.is_login).unwrap_or(false)),
            -101 => Ok(false),
            code => Err(BiliError::Api {
                code,
                message: resp.message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Endpoints;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_sessdata_encoding_is_idempotent() {
        let raw = Credential::builder().sessdata("abc ").build();
        assert_eq!(raw.sessdata(), Some("abc%20"));

        let encoded = Credential::builder().sessdata("abc%20").build();
        assert_eq!(encoded.sessdata(), Some("abc%20"));

        let again = Credential::builder()
            .sessdata(raw.sessdata().unwrap())
            .build();
        assert_eq!(again, raw);
    }

    #[test]
    fn test_sessdata_encoding_keeps_slash() {
        assert_eq!(encode_sessdata("a/b,c*d"), "a/b%2Cc%2Ad");
        assert_eq!(encode_sessdata("plain123"), "plain123");
    }

    #[test]
    fn test_predicates_require_sessdata() {
        let credential = Credential::builder().sessdata("").bili_jct("def").build();
        assert!(!credential.has_sessdata());
        assert!(!credential.has_bili_jct());

        let credential = Credential::builder().bili_jct("def").buvid3("b").build();
        assert!(!credential.has_bili_jct());
        assert!(!credential.has_buvid3());

        let credential = Credential::builder()
            .sessdata("abc")
            .bili_jct("def")
            .build();
        assert!(credential.has_sessdata());
        assert!(credential.has_bili_jct());
        assert!(!credential.has_buvid3());
        assert!(!credential.has_dedeuserid());
        assert!(!credential.has_ac_time_value());
    }

    #[test]
    fn test_raise_for_missing_fields() {
        let empty = Credential::builder().sessdata("").build();
        assert!(matches!(
            empty.raise_for_no_sessdata(),
            Err(BiliError::MissingCredential(CredentialField::Sessdata))
        ));

        let credential = Credential::builder().sessdata("abc").build();
        assert!(credential.raise_for_no_sessdata().is_ok());
        assert!(matches!(
            credential.raise_for_no_bili_jct(),
            Err(BiliError::MissingCredential(CredentialField::BiliJct))
        ));
        assert!(matches!(
            credential.raise_for_no_buvid3(),
            Err(BiliError::MissingCredential(CredentialField::Buvid3))
        ));
        assert!(matches!(
            credential.raise_for_no_dedeuserid(),
            Err(BiliError::MissingCredential(CredentialField::DedeUserId))
        ));
        assert!(matches!(
            credential.raise_for_no_ac_time_value(),
            Err(BiliError::MissingCredential(CredentialField::AcTimeValue))
        ));
    }

    #[test]
    fn test_cookies_without_dedeuserid() {
        let credential = Credential::builder()
            .sessdata("abc")
            .bili_jct("def")
            .build();
        let cookies = credential.get_cookies();

        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("SESSDATA").map(String::as_str), Some("abc"));
        assert_eq!(cookies.get("bili_jct").map(String::as_str), Some("def"));
        assert!(!cookies.contains_key("DedeUserID"));

        let blank_uid = Credential::builder().sessdata("abc").dedeuserid("").build();
        assert!(!blank_uid.get_cookies().contains_key("DedeUserID"));
    }

    #[test]
    fn test_cookies_merge_extras_after_typed_fields() {
        let credential = Credential::builder()
            .sessdata("abc")
            .buvid3("b3")
            .dedeuserid("123")
            .ac_time_value("rt")
            .extra("buvid4", "b4")
            .extra("SESSDATA", "ignored")
            .extra("buvid4", "b4-new")
            .build();

        let pairs = credential.cookie_pairs();
        let names: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            ["SESSDATA", "buvid3", "ac_time_value", "DedeUserID", "buvid4"]
        );
        assert_eq!(pairs[0].1, "abc");
        assert_eq!(pairs[4].1, "b4-new");
        assert_eq!(
            credential.cookie_header(),
            "SESSDATA=abc; buvid3=b3; ac_time_value=rt; DedeUserID=123; buvid4=b4-new"
        );
    }

    #[test]
    fn test_serde_roundtrip_reapplies_encoding() {
        let json = r#"{"sessdata":"a b","bili_jct":"j","buvid3":null,"dedeuserid":"1","ac_time_value":null,"extra":[["buvid4","x"]]}"#;
        let credential: Credential = serde_json::from_str(json).unwrap();
        assert_eq!(credential.sessdata(), Some("a%20b"));
        assert_eq!(credential.extra(), &[("buvid4".to_string(), "x".to_string())]);

        let back: Credential =
            serde_json::from_str(&serde_json::to_string(&credential).unwrap()).unwrap();
        assert_eq!(back, credential);
    }

    async fn mock_client(server: &MockServer) -> ApiClient {
        ApiClient::builder()
            .endpoints(Endpoints::single(server.uri()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_check_valid_logged_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/web-interface/nav"))
            .and(header("Cookie", "SESSDATA=abc; bili_jct=def"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "message": "0",
                "data": {"isLogin": true, "mid": 123, "uname": "u"}
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server).await;
        let credential = Credential::builder()
            .sessdata("abc")
            .bili_jct("def")
            .build();
        assert!(credential.check_valid(&client).await.unwrap());
    }

    #[tokio::test]
    async fn test_check_valid_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/web-interface/nav"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": -101,
                "message": "账号未登录",
                "data": {"isLogin": false}
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server).await;
        let credential = Credential::builder().sessdata("expired").build();
        assert!(!credential.check_valid(&client).await.unwrap());
    }

    #[tokio::test]
    async fn test_check_valid_other_code_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/web-interface/nav"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": -412,
                "message": "请求被拦截"
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server).await;
        let err = Credential::default().check_valid(&client).await.unwrap_err();
        assert!(matches!(err, BiliError::Api { code: -412, .. }));
    }
}
