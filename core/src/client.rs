use crate::config::ClientSettings;
use crate::error::ApiError;
use crate::events::EventBus;
use crate::middleware::{AuthLayer, Middleware, Next, RetryLayer};
use crate::session::Session;
use crate::transport::{
    FormPart, HttpRequest, HttpResponse, ReqwestTransport, RequestBody, Transport,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn, Instrument};
use url::Url;
use uuid::Uuid;

const SUCCESS_CODE: i64 = 200;

/// A backend call described by verb, path and parameters, before the base
/// URL and session are applied.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub extended_timeout: bool,
}

impl ApiRequest {
    /// `path` is a literal such as `/analyses`; dynamic parts go through
    /// [`segment`](Self::segment) so they are percent-encoded.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_owned)
                .collect(),
            query: Vec::new(),
            body: RequestBody::Empty,
            extended_timeout: false,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn segment(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_owned());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn extended_timeout(mut self) -> Self {
        self.extended_timeout = true;
        self
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    fn is_auth_request(&self) -> bool {
        matches!(
            self.segments.as_slice(),
            [first, second, ..] if first == "auth" && (second == "login" || second == "register")
        )
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the analytics backend.
///
/// Requests run through the middleware chain (session auth, then retry) to
/// the transport. Every terminal failure is reported once on the event bus
/// before it is returned.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    settings: ClientSettings,
    session: Session,
    events: EventBus,
    transport: Arc<dyn Transport>,
    layers: Vec<Arc<dyn Middleware>>,
}

pub struct ApiClientBuilder {
    settings: ClientSettings,
    session: Session,
    events: EventBus,
    transport: Option<Arc<dyn Transport>>,
    extra_layers: Vec<Arc<dyn Middleware>>,
}

impl ApiClientBuilder {
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Appends a layer after the built-in auth and retry layers.
    pub fn layer(mut self, layer: Arc<dyn Middleware>) -> Self {
        self.extra_layers.push(layer);
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let mut layers: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(AuthLayer::new(self.session.clone())),
            Arc::new(RetryLayer::new(self.settings.retry)),
        ];
        layers.extend(self.extra_layers);
        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                settings: self.settings,
                session: self.session,
                events: self.events,
                transport,
                layers,
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(settings: ClientSettings, session: Session) -> ApiClientBuilder {
        ApiClientBuilder {
            settings,
            session,
            events: EventBus::detached(),
            transport: None,
            extra_layers: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub(crate) fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.inner.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    /// Send a request and decode the envelope's `data` into `T`.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.dispatch(&request).await?;
        self.decode_envelope(&response.body)
            .map_err(|err| self.fail(&request, err))
    }

    /// Send a request whose success body is raw bytes (file downloads).
    pub async fn request_bytes(&self, request: ApiRequest) -> Result<Vec<u8>, ApiError> {
        Ok(self.dispatch(&request).await?.body)
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<HttpResponse, ApiError> {
        let url = self
            .url_for(request)
            .map_err(|err| self.fail(request, err))?;
        let settings = &self.inner.settings;
        let mut http = HttpRequest::new(request.method.clone(), url);
        http.body = request.body.clone();
        http.timeout = Some(if request.extended_timeout {
            settings.extended_timeout
        } else {
            settings.timeout
        });

        let span = tracing::debug_span!(
            "api_request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            path = %request.path(),
        );
        let outcome = Next::new(self.transport(), &self.inner.layers)
            .run(http)
            .instrument(span)
            .await;

        match outcome {
            Ok(response) if response.is_success() => {
                debug!(status = response.status, "request succeeded");
                Ok(response)
            }
            Ok(response) => {
                let err = self.status_error(request, &response);
                Err(self.fail(request, err))
            }
            Err(err) => Err(self.fail(request, ApiError::Network(err))),
        }
    }

    fn status_error(&self, request: &ApiRequest, response: &HttpResponse) -> ApiError {
        let detail = server_detail(&response.body);
        match response.status {
            401 => {
                let had_session = self.inner.session.is_logged_in();
                if had_session && !request.is_auth_request() {
                    if let Err(err) = self.inner.session.clear() {
                        warn!(%err, "failed to clear persisted session");
                    }
                    self.inner.events.redirect_to_login();
                    ApiError::Unauthorized {
                        message: detail.unwrap_or_else(|| "Session expired".to_string()),
                        session_expired: true,
                    }
                } else {
                    ApiError::Unauthorized {
                        message: detail.unwrap_or_else(|| "Unauthorized".to_string()),
                        session_expired: false,
                    }
                }
            }
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            status if status >= 500 => ApiError::Server { status },
            status => ApiError::Http {
                status,
                message: detail.unwrap_or_else(|| "Request failed".to_string()),
            },
        }
    }

    fn decode_envelope<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, ApiError> {
        let envelope: Envelope = if body.iter().all(u8::is_ascii_whitespace) {
            Envelope {
                code: None,
                message: None,
                data: Value::Null,
            }
        } else {
            serde_json::from_slice(body)?
        };
        if let Some(code) = envelope.code {
            if code != SUCCESS_CODE {
                return Err(ApiError::Application {
                    code,
                    message: envelope
                        .message
                        .filter(|message| !message.is_empty())
                        .unwrap_or_else(|| "Request failed".to_string()),
                });
            }
        }
        Ok(serde_json::from_value(envelope.data)?)
    }

    /// Surface a terminal failure to the user exactly once.
    fn fail(&self, request: &ApiRequest, err: ApiError) -> ApiError {
        warn!(method = %request.method, path = %request.path(), %err, "request failed");
        self.inner.events.notify(err.user_message());
        err
    }
}

fn server_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    match parsed.detail {
        Some(Value::String(detail)) if !detail.is_empty() => Some(detail),
        _ => parsed.message.filter(|message| !message.is_empty()),
    }
}
