use crate::error::TransportError;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// `None` leaves the request unbounded (used for streams).
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name.to_owned(), value)),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone)]
pub enum PartValue {
    Text(String),
    File(FileUpload),
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file: FileUpload) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File(file),
        }
    }
}

/// File contents held in memory so a request can be rebuilt per attempt.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename).to_string();
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    pub async fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(filename, bytes))
    }
}

fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

pub struct StreamingResponse {
    pub status: u16,
    pub body: ByteStream,
}

/// The wire. Implementations never interpret status codes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    async fn open_stream(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("contentlens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    fn build(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut builder = self.http.request(request.method, request.url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };
        Ok(builder)
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in parts {
        form = match part.value {
            PartValue::Text(text) => form.text(part.name, text),
            PartValue::File(file) => {
                let body = Part::bytes(file.bytes)
                    .file_name(file.filename)
                    .mime_str(&file.content_type)
                    .map_err(|err| TransportError::Other(err.to_string()))?;
                form.part(part.name, body)
            }
        };
    }
    Ok(form)
}

/// A body cut off after the headers arrived is a dropped connection.
fn body_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connect(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.build(request)?.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(body_error)?.to_vec();
        Ok(HttpResponse { status, body })
    }

    async fn open_stream(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        let response = self.build(request)?.send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(TransportError::from)
            })
            .boxed();
        Ok(StreamingResponse { status, body })
    }
}

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Response(HttpResponse),
    Failure(TransportError),
    Stream { status: u16, chunks: Vec<Vec<u8>> },
}

/// In-process transport replaying queued replies in order and recording
/// every request it receives.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: ScriptedReply) -> &Self {
        self.replies.lock().push_back(reply);
        self
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(ScriptedReply::Response(HttpResponse {
            status,
            body: body.to_string().into_bytes(),
        }))
    }

    pub fn push_bytes(&self, status: u16, body: Vec<u8>) -> &Self {
        self.push(ScriptedReply::Response(HttpResponse { status, body }))
    }

    pub fn push_failure(&self, err: TransportError) -> &Self {
        self.push(ScriptedReply::Failure(err))
    }

    pub fn push_stream<I, C>(&self, status: u16, chunks: I) -> &Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        self.push(ScriptedReply::Stream {
            status,
            chunks: chunks.into_iter().map(Into::into).collect(),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn next_reply(&self, request: HttpRequest) -> Result<ScriptedReply, TransportError> {
        tracing::trace!(method = %request.method, url = %request.url, "scripted transport request");
        self.requests.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::Other("no scripted reply queued".to_string()))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.next_reply(request)? {
            ScriptedReply::Response(response) => Ok(response),
            ScriptedReply::Failure(err) => Err(err),
            ScriptedReply::Stream { status, chunks } => Ok(HttpResponse {
                status,
                body: chunks.concat(),
            }),
        }
    }

    async fn open_stream(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        let (status, chunks) = match self.next_reply(request)? {
            ScriptedReply::Response(response) => (response.status, vec![response.body]),
            ScriptedReply::Failure(err) => return Err(err),
            ScriptedReply::Stream { status, chunks } => (status, chunks),
        };
        Ok(StreamingResponse {
            status,
            body: stream::iter(chunks.into_iter().map(Ok)).boxed(),
        })
    }
}
