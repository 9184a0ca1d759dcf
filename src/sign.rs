//! Request signing: app-key signatures for TV endpoints and WBI for web endpoints.

use md5::{Digest, Md5};

/// App key of the TV client.
pub const TV_APPKEY: &str = "4409e2ce8ffd12b8";
/// App secret paired with [`TV_APPKEY`].
pub const TV_APPSEC: &str = "59b43e04ad6965f34319062b478f83dd";

const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Form-encode already sorted pairs the way the app API expects (`+` for space).
fn form_encode(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k).replace("%20", "+"),
                urlencoding::encode(v).replace("%20", "+")
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign app API parameters in place.
///
/// Adds `appkey` and appends `sign = md5(sorted query + appsec)`.
pub fn sign_app_params(params: &mut Vec<(String, String)>, appkey: &str, appsec: &str) {
    params.retain(|(k, _)| k != "appkey" && k != "sign");
    params.push(("appkey".to_string(), appkey.to_string()));
    params.sort_by(|a, b| a.0.cmp(&b.0));

    let sign = md5_hex(&format!("{}{}", form_encode(params), appsec));
    params.push(("sign".to_string(), sign));
}

/// WBI keys taken from the nav endpoint's `wbi_img` URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WbiKeys {
    pub img_key: String,
    pub sub_key: String,
}

impl WbiKeys {
    /// Extract keys from the `img_url`/`sub_url` pair, e.g.
    /// `https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png`.
    pub fn from_urls(img_url: &str, sub_url: &str) -> Option<Self> {
        fn stem(url: &str) -> Option<String> {
            let file = url.rsplit('/').next()?;
            let stem = file.split('.').next()?;
            (!stem.is_empty()).then(|| stem.to_string())
        }

        Some(Self {
            img_key: stem(img_url)?,
            sub_key: stem(sub_url)?,
        })
    }

    /// Permute `img_key + sub_key` through the mixin table.
    pub fn mixin_key(&self) -> String {
        let raw: Vec<char> = format!("{}{}", self.img_key, self.sub_key).chars().collect();
        MIXIN_KEY_ENC_TAB
            .iter()
            .filter_map(|&i| raw.get(i))
            .take(32)
            .collect()
    }

    /// Sign query parameters for a WBI endpoint.
    ///
    /// Returns the sorted parameters including `wts` and `w_rid`.
    pub fn sign(&self, params: &[(String, String)], wts: i64) -> Vec<(String, String)> {
        let mut signed: Vec<(String, String)> = params
            .iter()
            .filter(|(k, _)| k != "wts" && k != "w_rid")
            .map(|(k, v)| {
                let cleaned: String = v.chars().filter(|c| !"!'()*".contains(*c)).collect();
                (k.clone(), cleaned)
            })
            .collect();
        signed.push(("wts".to_string(), wts.to_string()));
        signed.sort_by(|a, b| a.0.cmp(&b.0));

        let query = signed
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let w_rid = md5_hex(&format!("{}{}", query, self.mixin_key()));
        signed.push(("w_rid".to_string(), w_rid));
        signed
    }
}
