//! Caller-owned remote session state.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientResult;
use crate::jwt::{self, TokenClaims};

/// A bearer token together with its decoded claims.
#[derive(Debug, Clone)]
pub struct AccessToken {
    raw: String,
    claims: TokenClaims,
}

impl AccessToken {
    /// Decode the claims of a raw token string.
    pub fn decode(raw: String) -> ClientResult<Self> {
        let claims = jwt::decode_claims(&raw)?;
        Ok(Self { raw, claims })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// Whether the token expires within `seconds` from now. Tokens without
    /// an `exp` claim never report as expiring.
    pub fn expires_within(&self, seconds: i64) -> bool {
        match self.claims.exp {
            Some(exp) => exp - chrono::Utc::now().timestamp() < seconds,
            None => false,
        }
    }

    /// Whether the token grants the named capability.
    pub fn has_permission(&self, name: &str) -> bool {
        self.claims.permissions.contains(name)
    }
}

/// Server metadata consumed by this client.
#[derive(Debug, Clone, Default)]
pub struct ServerMetadata {
    /// Server locale language, if reported.
    pub lang: Option<String>,
    /// Web API version string.
    pub version: String,
}

/// Raw metadata response shape; only `locale.lang` and the web API version
/// are consumed.
#[derive(Debug, Deserialize)]
pub(crate) struct MetadataResponse {
    #[serde(default)]
    pub locale: Option<Value>,
    #[serde(default)]
    pub gramps_webapi: Option<Value>,
}

impl From<MetadataResponse> for ServerMetadata {
    fn from(raw: MetadataResponse) -> Self {
        let lang = raw
            .locale
            .as_ref()
            .and_then(|l| l.get("lang"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let version = raw
            .gramps_webapi
            .as_ref()
            .and_then(|w| w.get("version"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self { lang, version }
    }
}

/// Mutable per-connection state: credentials, cached token, cached server
/// metadata. Owned by the caller and passed by reference into
/// [`ApiClient::new`](crate::client::ApiClient::new); refreshing the token
/// mutates it in place, which is safe under the engine's single-threaded,
/// sequential execution model.
#[derive(Debug, Clone)]
pub struct Session {
    base_url: String,
    pub username: String,
    pub password: String,
    pub token: Option<AccessToken>,
    pub metadata: Option<ServerMetadata>,
}

impl Session {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            username: username.into(),
            password: password.into(),
            token: None,
            metadata: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the base URL already carries the API path segment.
    pub fn has_api_segment(&self) -> bool {
        self.base_url.ends_with("/api")
    }

    /// One-shot endpoint autocorrection: append the API path segment.
    pub(crate) fn append_api_segment(&mut self) {
        self.base_url.push_str("/api");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_url_is_normalized() {
        let session = Session::new("https://example.org/tree//", "u", "p");
        assert_eq!(session.base_url(), "https://example.org/tree");
        assert!(!session.has_api_segment());
    }

    #[test]
    fn api_segment_detection() {
        let mut session = Session::new("https://example.org", "u", "p");
        session.append_api_segment();
        assert_eq!(session.base_url(), "https://example.org/api");
        assert!(session.has_api_segment());
    }

    #[test]
    fn metadata_extracts_lang_and_version() {
        let raw: MetadataResponse = serde_json::from_value(json!({
            "locale": {"lang": "de", "language": "Deutsch"},
            "gramps_webapi": {"version": "2.7.0"},
            "surnames": 1234
        }))
        .unwrap();
        let meta = ServerMetadata::from(raw);
        assert_eq!(meta.lang.as_deref(), Some("de"));
        assert_eq!(meta.version, "2.7.0");
    }
}
