//! The API client: authentication, transactions, and task polling.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use stemma_core::engine::RemoteCommitter;
use stemma_types::{BackgroundTask, ProgressFn, TaskState, TaskStatus, TransactionEntry};

use crate::error::{ClientError, ClientResult};
use crate::session::{AccessToken, MetadataResponse, ServerMetadata, Session};
use crate::version::supports_background;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Refresh the token proactively when less than this much lifetime remains.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Delay between background-task status checks.
const TASK_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TaskAccepted {
    task: BackgroundTask,
}

/// A media record reported by the server as lacking a backing file.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRecord {
    pub handle: String,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

/// Client for the remote web API. Borrows a caller-owned [`Session`] for
/// its lifetime; token and metadata caches live in the session, not in any
/// process-wide state.
pub struct ApiClient<'s> {
    pub(crate) session: &'s mut Session,
    pub(crate) http: Client,
}

impl<'s> ApiClient<'s> {
    /// Build a client over the given session.
    ///
    /// Trust roots are selected at build time: on macOS the
    /// `rustls-tls-native-roots` feature pulls certificates from the OS
    /// keychain, elsewhere the built-in webpki roots apply.
    pub fn new(session: &'s mut Session) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { session, http })
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub(crate) fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let raw = format!("{}/{}", self.session.base_url(), path);
        Url::parse(&raw).map_err(|e| ClientError::InvalidResponse(format!("bad endpoint {raw}: {e}")))
    }

    // ----- authentication -------------------------------------------------

    /// Fetch a fresh token with the session credentials.
    ///
    /// On a decode failure against a base URL that lacks the API path
    /// segment, the segment is appended and the request retried once; any
    /// further failure propagates. The fallback is one-shot by construction.
    pub async fn fetch_token(&mut self) -> ClientResult<()> {
        match self.request_token().await {
            Ok(token) => {
                self.session.token = Some(token);
                Ok(())
            }
            Err(ClientError::InvalidResponse(detail)) if !self.session.has_api_segment() => {
                tracing::info!(
                    "Token response not decodable ({}); retrying with API path segment",
                    detail
                );
                self.session.append_api_segment();
                let token = self.request_token().await?;
                self.session.token = Some(token);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn request_token(&mut self) -> ClientResult<AccessToken> {
        let url = self.endpoint("token/")?;
        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "username": self.session.username,
                "password": self.session.password,
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Auth(format!("credentials rejected ({status})")));
        }
        if !status.is_success() {
            return Err(Self::unexpected_status(resp).await);
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("token endpoint: {e}")))?;
        AccessToken::decode(body.access_token)
    }

    /// Cached token read path: fetches lazily and refreshes proactively when
    /// the remaining lifetime drops under the margin.
    pub async fn access_token(&mut self) -> ClientResult<String> {
        let stale = match &self.session.token {
            Some(token) => token.expires_within(TOKEN_REFRESH_MARGIN_SECS),
            None => true,
        };
        if stale {
            self.fetch_token().await?;
        }
        let token = self
            .session
            .token
            .as_ref()
            .ok_or_else(|| ClientError::Auth("no token after refresh".into()))?;
        Ok(token.as_str().to_string())
    }

    async fn send(
        &mut self,
        method: Method,
        url: Url,
        json: Option<&Value>,
        body: Option<Bytes>,
    ) -> ClientResult<Response> {
        let token = self.access_token().await?;
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(json) = json {
            request = request.json(json);
        }
        if let Some(body) = body {
            request = request.body(body);
        }
        Ok(request.send().await?)
    }

    /// Authenticated request with the 401 recovery rule: one forced token
    /// refresh and one retry; a second 401 surfaces as an auth error.
    pub(crate) async fn authed(
        &mut self,
        method: Method,
        url: Url,
        json: Option<&Value>,
        body: Option<Bytes>,
    ) -> ClientResult<Response> {
        let resp = self.send(method.clone(), url.clone(), json, body.clone()).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        tracing::warn!("401 from {}, forcing token refresh", url);
        self.fetch_token().await?;
        let resp = self.send(method, url, json, body).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Auth("still unauthorized after token refresh".into()));
        }
        Ok(resp)
    }

    pub(crate) async fn unexpected_status(resp: Response) -> ClientError {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        ClientError::Server { status, message }
    }

    // ----- metadata -------------------------------------------------------

    /// Fetch and cache server metadata (locale, web API version).
    pub async fn get_metadata(&mut self) -> ClientResult<ServerMetadata> {
        let url = self.endpoint("metadata/")?;
        let resp = self.authed(Method::GET, url, None, None).await?;
        if !resp.status().is_success() {
            return Err(Self::unexpected_status(resp).await);
        }
        let raw: MetadataResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("metadata endpoint: {e}")))?;
        let metadata = ServerMetadata::from(raw);
        self.session.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    async fn server_version(&mut self) -> ClientResult<String> {
        if let Some(metadata) = &self.session.metadata {
            return Ok(metadata.version.clone());
        }
        Ok(self.get_metadata().await?.version)
    }

    // ----- transactions ---------------------------------------------------

    /// Submit a transaction payload. No-op on an empty payload. Servers new
    /// enough to support background processing get the background flag and
    /// a 202 response is polled to completion; any other success status is
    /// treated as already complete.
    pub async fn commit(
        &mut self,
        entries: &[TransactionEntry],
        force: bool,
        progress: Option<&ProgressFn>,
    ) -> ClientResult<()> {
        if entries.is_empty() {
            tracing::debug!("Empty transaction payload, nothing to commit");
            return Ok(());
        }

        let background = supports_background(&self.server_version().await?);
        let mut url = self.endpoint("transactions/")?;
        if force {
            url.query_pairs_mut().append_pair("force", "1");
        }
        if background {
            url.query_pairs_mut().append_pair("background", "1");
        }

        let payload = serde_json::to_value(entries)?;
        let resp = self.authed(Method::POST, url, Some(&payload), None).await?;
        match resp.status() {
            StatusCode::ACCEPTED => {
                let accepted: TaskAccepted = resp
                    .json()
                    .await
                    .map_err(|e| ClientError::InvalidResponse(format!("task response: {e}")))?;
                tracing::info!("Transaction accepted as background task {}", accepted.task.id);
                self.poll_task(&accepted.task.id, progress).await
            }
            status if status.is_success() => Ok(()),
            _ => Err(Self::unexpected_status(resp).await),
        }
    }

    /// Poll a background task until it reaches a terminal state.
    ///
    /// A transient network error while polling is logged and returns
    /// control to the caller instead of raising; the overall sync is
    /// expected to be retried later. This is a lenient boundary, not a
    /// success signal.
    pub async fn poll_task(
        &mut self,
        task_id: &str,
        progress: Option<&ProgressFn>,
    ) -> ClientResult<()> {
        let url = self.endpoint(&format!("tasks/{task_id}"))?;
        loop {
            let resp = match self.authed(Method::GET, url.clone(), None, None).await {
                Ok(resp) => resp,
                Err(ClientError::Network(e)) => {
                    tracing::warn!("Network error while polling task {}: {}", task_id, e);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            if !resp.status().is_success() {
                return Err(Self::unexpected_status(resp).await);
            }
            let status: TaskStatus = resp
                .json()
                .await
                .map_err(|e| ClientError::InvalidResponse(format!("task status: {e}")))?;

            match status.state {
                TaskState::Success => return Ok(()),
                TaskState::Failure | TaskState::Revoked => {
                    return Err(ClientError::ServerTask {
                        state: status.state.to_string(),
                        detail: status
                            .info
                            .unwrap_or_else(|| "no detail provided".to_string()),
                    });
                }
                _ => {
                    if let Some(callback) = progress {
                        callback(status.progress());
                    }
                    tokio::time::sleep(TASK_POLL_INTERVAL).await;
                }
            }
        }
    }

    // ----- media ----------------------------------------------------------

    /// Remote media records that have no backing file.
    pub async fn get_missing_files(&mut self) -> ClientResult<Vec<MediaRecord>> {
        let url = self.endpoint("media/?filemissing=1")?;
        let resp = self.authed(Method::GET, url, None, None).await?;
        if !resp.status().is_success() {
            return Err(Self::unexpected_status(resp).await);
        }
        resp.json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("media endpoint: {e}")))
    }
}

#[async_trait]
impl RemoteCommitter for ApiClient<'_> {
    async fn commit_transaction(
        &mut self,
        entries: &[TransactionEntry],
        force: bool,
        progress: Option<&ProgressFn>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.commit(entries, force, progress).await.map_err(Into::into)
    }
}
