//! Authenticated requests with silent token refresh.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ApiError, Result};
use crate::session::Session;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use crate::types::{AuthTokens, RefreshRequest};

pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Method, body and extra headers of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    /// Options for a request without a body.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    pub fn delete() -> Self {
        Self::new(Method::Delete)
    }

    pub fn post(body: impl Serialize) -> Result<Self> {
        Self::with_body(Method::Post, body)
    }

    pub fn put(body: impl Serialize) -> Result<Self> {
        Self::with_body(Method::Put, body)
    }

    pub fn with_body(method: Method, body: impl Serialize) -> Result<Self> {
        Ok(Self {
            method,
            body: Some(serde_json::to_value(body)?),
            headers: Vec::new(),
        })
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Optimistic concurrency guard for updates and deletes.
    pub fn if_match(self, version: u64) -> Self {
        self.header("If-Match", version.to_string())
    }
}

/// Successful response of [`ApiClient::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    /// 204 No Content, or an empty body.
    Empty,
}

impl ApiResponse {
    /// Decode the body. `None` for an empty response.
    pub fn json<T: DeserializeOwned>(self) -> Result<Option<T>> {
        match self {
            ApiResponse::Json(value) => Ok(Some(serde_json::from_value(value)?)),
            ApiResponse::Empty => Ok(None),
        }
    }

    /// Decode a body that must be present.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        self.json()?
            .ok_or_else(|| ApiError::decode("expected a response body, got none"))
    }
}

type RefreshFuture = Shared<BoxFuture<'static, bool>>;

struct ClientInner {
    transport: Arc<dyn HttpTransport>,
    session: Session,
    /// The refresh currently in flight. Only callers awaiting it keep it
    /// alive: once all of them are dropped the handle no longer upgrades and
    /// the next 401 starts a refresh with the session's current token.
    /// Cleared by the refresh itself when it finishes.
    refresh: Mutex<Option<WeakShared<BoxFuture<'static, bool>>>>,
}

/// Client for the Iris backend. Cheap to clone; clones share the session and
/// the in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: Session) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                session,
                refresh: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Send an authenticated request.
    ///
    /// A 401 triggers one token refresh (shared with any concurrent caller)
    /// and one retry. If the request is still unauthorized the session is
    /// cleared and [`ApiError::Unauthorized`] returned.
    pub async fn fetch(&self, path: &str, options: RequestOptions) -> Result<ApiResponse> {
        let mut response = self.inner.send(path, &options).await?;

        if response.status == 401 && self.inner.session.refresh_token().is_some() {
            debug!(method = %options.method, path, "access token rejected, refreshing");
            if self.try_refresh().await {
                response = self.inner.send(path, &options).await?;
                debug!(method = %options.method, path, status = response.status, "retried after refresh");
            }
        }

        interpret(response, &self.inner.session)
    }

    /// Exchange the refresh token for new tokens. Concurrent calls share a
    /// single request. Returns `false` without a request if there is no
    /// refresh token, and clears the session if the refresh fails.
    pub async fn try_refresh(&self) -> bool {
        let refresh = {
            let mut slot = self
                .inner
                .refresh
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref().and_then(WeakShared::upgrade) {
                Some(in_flight) => in_flight,
                None => {
                    let Some(refresh_token) = self.inner.session.refresh_token() else {
                        return false;
                    };
                    let inner = Arc::clone(&self.inner);
                    let refresh: RefreshFuture = async move {
                        let refreshed = inner.refresh_tokens(refresh_token).await;
                        *inner.refresh.lock().unwrap_or_else(PoisonError::into_inner) = None;
                        refreshed
                    }
                    .boxed()
                    .shared();
                    *slot = refresh.downgrade();
                    refresh
                }
            }
        };
        refresh.await
    }

    /// Send without bearer auth or refresh handling. Any non-2xx is returned
    /// as [`ApiError::Status`].
    pub(crate) async fn fetch_anonymous(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let request = build_request(path, &options, None)?;
        let response = self.inner.transport.send(request).await?;
        if !response.is_success() {
            return Err(status_error(&response));
        }
        decode_body(response)
    }
}

impl ClientInner {
    async fn send(&self, path: &str, options: &RequestOptions) -> Result<HttpResponse> {
        let token = self.session.access_token();
        let request = build_request(path, options, token.as_deref())?;
        self.transport.send(request).await
    }

    async fn refresh_tokens(&self, refresh_token: String) -> bool {
        let request = RequestOptions::post(RefreshRequest {
            refresh_token: &refresh_token,
        })
        .and_then(|options| build_request(REFRESH_PATH, &options, None));
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "could not build refresh request");
                self.session.clear_auth();
                return false;
            }
        };

        let outcome = match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                serde_json::from_slice::<AuthTokens>(&response.body).map_err(ApiError::from)
            }
            Ok(response) => Err(status_error(&response)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(tokens) => {
                self.session.update_tokens(tokens);
                info!("access token refreshed");
                true
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, clearing session");
                self.session.clear_auth();
                false
            }
        }
    }
}

fn build_request(
    path: &str,
    options: &RequestOptions,
    access_token: Option<&str>,
) -> Result<HttpRequest> {
    let mut request = HttpRequest::new(options.method, path);
    request
        .headers
        .push(("Content-Type".to_string(), "application/json".to_string()));
    if let Some(token) = access_token {
        request
            .headers
            .push(("Authorization".to_string(), format!("Bearer {token}")));
    }
    request.headers.extend(options.headers.iter().cloned());
    if let Some(body) = &options.body {
        request.body = Some(serde_json::to_vec(body)?);
    }
    Ok(request)
}

fn interpret(response: HttpResponse, session: &Session) -> Result<ApiResponse> {
    if response.status == 401 {
        session.clear_auth();
        return Err(ApiError::Unauthorized);
    }
    if !response.is_success() {
        return Err(status_error(&response));
    }
    decode_body(response)
}

fn decode_body(response: HttpResponse) -> Result<ApiResponse> {
    if response.status == 204 || response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApiResponse::Empty);
    }
    Ok(ApiResponse::Json(serde_json::from_slice(&response.body)?))
}

/// Error for a non-2xx response: the body's `detail` string if it is
/// non-empty, else the reason phrase.
fn status_error(response: &HttpResponse) -> ApiError {
    let detail = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("detail")?.as_str().map(str::to_string))
        .filter(|detail| !detail.is_empty());
    ApiError::Status {
        status: response.status,
        message: detail.unwrap_or_else(|| response.status_text.clone()),
    }
}
