use std::fmt;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};

use crate::HttpError;

/// Outbound request description, replayed verbatim on every attempt.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("authorization") {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body.as_ref().map(String::len))
            .finish()
    }
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Appends a header. Repeated names are sent repeatedly.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the `Authorization` header from a bearer token.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let authorization = normalize_bearer_authorization(token.as_ref());
        self.header("Authorization", authorization)
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `payload` as the JSON body and sets `Content-Type`.
    pub fn json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_string(payload)
            .map_err(|err| HttpError::Encode(format!("request body: {err}")))?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }
}

/// Successful (2xx) response.
///
/// The body is kept as received; text and JSON are decoded on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns the first header value with the given case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<&str, HttpError> {
        std::str::from_utf8(&self.body)
            .map_err(|err| HttpError::Decode(format!("response body is not UTF-8: {err}")))
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|err| {
            HttpError::Decode(format!(
                "invalid response JSON: {err}; body: {}",
                String::from_utf8_lossy(&self.body)
            ))
        })
    }
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{HttpRequest, HttpResponse};
    use crate::HttpError;

    fn authorization(request: &HttpRequest) -> Option<&str> {
        request
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn bearer_auth_adds_missing_prefix_and_trims() {
        let request = HttpRequest::get("https://api.example.test/items").bearer_auth("  abc123 ");
        assert_eq!(authorization(&request), Some("Bearer abc123"));
    }

    #[test]
    fn bearer_auth_keeps_existing_prefix_in_any_case() {
        let request =
            HttpRequest::get("https://api.example.test/items").bearer_auth("bEaReR abc123");
        assert_eq!(authorization(&request), Some("bEaReR abc123"));
    }

    #[test]
    fn bearer_auth_short_token_is_prefixed() {
        let request = HttpRequest::get("https://api.example.test/items").bearer_auth("Bear");
        assert_eq!(authorization(&request), Some("Bearer Bear"));
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let request =
            HttpRequest::get("https://api.example.test/items").bearer_auth("secret-token");
        let debug = format!("{request:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = HttpRequest::post("https://api.example.test/items")
            .json(&serde_json::json!({"name": "Kit"}))
            .expect("payload serializes");
        assert_eq!(request.body.as_deref(), Some(r#"{"name":"Kit"}"#));
        assert!(request
            .headers
            .iter()
            .any(|(k, v)| k == "Content-Type" && v == "application/json"));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[test]
    fn response_json_decodes_and_reports_bad_body() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".to_owned(), "application/json".to_owned())],
            body: br#"{"id": 7}"#.to_vec(),
        };
        assert_eq!(response.json::<Item>().expect("valid json"), Item { id: 7 });
        assert_eq!(response.header("Content-Type"), Some("application/json"));

        assert_eq!(response.text().expect("utf-8 body"), r#"{"id": 7}"#);

        let broken = HttpResponse {
            body: b"not json".to_vec(),
            ..response
        };
        match broken.json::<Item>() {
            Err(HttpError::Decode(message)) => assert!(message.contains("not json")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn binary_body_is_kept_verbatim() {
        let payload = vec![0x89, b'P', b'N', b'G', 0xff, 0x00, 0xfe];
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: payload.clone(),
        };

        assert_eq!(response.bytes(), payload.as_slice());
        assert!(matches!(response.text(), Err(HttpError::Decode(_))));
        assert!(matches!(
            response.json::<serde_json::Value>(),
            Err(HttpError::Decode(_))
        ));
    }
}
