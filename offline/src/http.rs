//! Request / Response Model
//!
//! Just enough of the fetch model to route a request, key the content
//! cache and build the sync POSTs. Header names are always stored
//! lower-case.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }

    /// GET and HEAD are the only methods the worker intercepts.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl core::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing or intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Absolute URL; also the cache key.
    pub url: String,
    pub method: RequestMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Plain GET.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: RequestMethod::default(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// GET as a browser navigation sends it (accepts HTML).
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(url).with_header("accept", "text/html,application/xhtml+xml")
    }

    /// JSON POST, as sent by the sync drain.
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: RequestMethod::Post,
            body: Some(body),
            ..Self::new(url).with_header("content-type", "application/json")
        }
    }

    pub fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }

    /// `Accept` mentions `text/html`.
    pub fn accepts_html(&self) -> bool {
        self.header("accept")
            .is_some_and(|accept| accept.contains("text/html"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    #[default]
    Basic,
    /// No response could be produced (status 0).
    Error,
}

/// A response from the network, the cache or the worker itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub response_type: ResponseType,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    /// Empty-bodied response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            response_type: ResponseType::Basic,
            status,
            status_text: reason_phrase(status).to_string(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// The network-error response handed to the page when nothing else
    /// can answer.
    pub fn error() -> Self {
        Self {
            response_type: ResponseType::Error,
            status: 0,
            status_text: String::new(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let mut response = Self::new(status);
        response
            .headers
            .insert("content-type".to_string(), content_type.to_string());
        response.body = body.into();
        response
    }

    /// 200 `application/json` response.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::with_body(200, "application/json", value.to_string().into_bytes())
    }

    /// 2xx.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }
}

fn lookup<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers.get(&name.to_ascii_lowercase()).map(String::as_str)
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}

/// `scheme://host[:port]` of an absolute URL, `None` for relative ones.
pub fn origin_of(url: &str) -> Option<&str> {
    let authority_start = url.find("://")? + 3;
    let authority_len = url[authority_start..]
        .find(['/', '?', '#'])
        .unwrap_or(url.len() - authority_start);
    (authority_len > 0).then(|| &url[..authority_start + authority_len])
}

/// Resolve a path against an origin. Absolute URLs pass through unchanged.
pub fn resolve(origin: &str, url: &str) -> String {
    if origin_of(url).is_some() {
        return url.to_string();
    }
    let base = origin.trim_end_matches('/');
    match url.strip_prefix('/') {
        Some(path) => format!("{}/{}", base, path),
        None => format!("{}/{}", base, url),
    }
}
