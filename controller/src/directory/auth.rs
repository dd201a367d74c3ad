use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Url};
use sha2::Sha256;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::DirectoryError;

type HmacSha256 = Hmac<Sha256>;

const AUTH_VERSION: &str = "1.0";
const TIMESTAMP_HEADER: &str = "x-crusoe-timestamp";

/// Signs Crusoe API requests with an access/secret key pair
#[derive(Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
}

impl RequestSigner {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Headers authenticating `method url` at the current time
    pub fn headers(&self, method: &Method, url: &Url) -> Result<HeaderMap, DirectoryError> {
        let timestamp = OffsetDateTime::now_utc()
            .replace_nanosecond(0)
            .map_err(|e| DirectoryError::Signing(e.to_string()))?
            .format(&Rfc3339)
            .map_err(|e| DirectoryError::Signing(e.to_string()))?;
        self.headers_at(method, url, &timestamp)
    }

    fn headers_at(
        &self,
        method: &Method,
        url: &Url,
        timestamp: &str,
    ) -> Result<HeaderMap, DirectoryError> {
        let signature = self.signature(method, url, timestamp)?;
        let authorization = format!("Bearer {}:{}:{}", AUTH_VERSION, self.access_key, signature);

        let mut headers = HeaderMap::new();
        headers.insert(
            TIMESTAMP_HEADER,
            HeaderValue::from_str(timestamp).map_err(|e| DirectoryError::Signing(e.to_string()))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&authorization)
                .map_err(|_| DirectoryError::Signing("access key is not a valid header value".into()))?,
        );
        Ok(headers)
    }

    fn signature(&self, method: &Method, url: &Url, timestamp: &str) -> Result<String, DirectoryError> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n",
            url.path(),
            canonical_query(url),
            method.as_str(),
            timestamp
        );

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| DirectoryError::Signing(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

/// Query parameters sorted by key, then value, and percent-encoded
fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, NON_ALPHANUMERIC),
                utf8_percent_encode(v, NON_ALPHANUMERIC)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
