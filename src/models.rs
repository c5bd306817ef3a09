use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{DEFAULT_CONTENT_TYPE, METHODS};

/// Header key -> value, as stored on a request
pub type HeaderMap = BTreeMap<String, String>;

/// HTTP method. Open string; the pickers only offer [`METHODS`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Method(String);

impl Method {
    pub fn new(method: impl Into<String>) -> Self {
        Method(method.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Method name right-padded to the longest offered method, for aligned labels
    pub fn label(&self) -> String {
        let width = METHODS.iter().map(|m| m.len()).max().unwrap_or(0);
        format!("{:<width$}", self.0, width = width)
    }

    /// Colour tag used by tree labels (`{color}`)
    pub fn tree_color(&self) -> &'static str {
        match self.0.as_str() {
            "GET" => "[blue:]",
            "POST" => "[green:]",
            "PUT" => "[orange:]",
            "PATCH" => "[cyan:]",
            "DELETE" => "[red:]",
            _ => "",
        }
    }

    /// Next offered method, wrapping. Unknown methods restart the cycle.
    pub fn next(&self) -> Method {
        let next = METHODS
            .iter()
            .position(|m| *m == self.0)
            .map(|i| METHODS[(i + 1) % METHODS.len()])
            .unwrap_or(METHODS[0]);
        Method::new(next)
    }

    pub fn has_body(&self) -> bool {
        matches!(self.0.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
    }
}

impl Default for Method {
    fn default() -> Self {
        Method::new("GET")
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        Method::new(value)
    }
}

/// Request URL, possibly holding `{name}` placeholders
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Url(String);

impl Url {
    pub fn new(url: impl Into<String>) -> Self {
        Url(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mutable access for in-place editing of a draft
    pub fn as_mut_string(&mut self) -> &mut String {
        &mut self.0
    }

    /// Last path segment prefixed with `~/`
    pub fn base(&self) -> String {
        let last = if self.0.is_empty() {
            "."
        } else {
            let trimmed = self.0.trim_end_matches('/');
            if trimmed.is_empty() {
                "/"
            } else {
                trimmed.rsplit('/').next().unwrap_or(trimmed)
            }
        };
        format!("~/{}", last)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Url {
    fn from(value: &str) -> Self {
        Url::new(value)
    }
}

/// The (method, url) primary key of a stored request
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: Method,
    pub url: Url,
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A stored, reusable request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "Method", default)]
    pub method: Method,
    #[serde(rename = "URL", default)]
    pub url: Url,
    #[serde(
        rename = "MapRequestHeaderKeyValue",
        default,
        deserialize_with = "null_as_default"
    )]
    pub headers: HeaderMap,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "ContentType", default = "default_content_type")]
    pub content_type: String,
    #[serde(rename = "ProjectName", default)]
    pub project_name: String,
    #[serde(rename = "Alias", default)]
    pub alias: String,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl Default for Request {
    fn default() -> Self {
        Request {
            method: Method::default(),
            url: Url::default(),
            headers: HeaderMap::new(),
            body: String::new(),
            content_type: default_content_type(),
            project_name: String::new(),
            alias: String::new(),
        }
    }
}

impl Request {
    pub fn new(method: impl Into<Method>, url: impl Into<Url>) -> Self {
        Request {
            method: method.into(),
            url: url.into(),
            ..Request::default()
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project_name = project.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn key(&self) -> RequestKey {
        RequestKey {
            method: self.method.clone(),
            url: self.url.clone(),
        }
    }

    /// Same (method, url) identity
    pub fn same_identity(&self, other: &Request) -> bool {
        self.method == other.method && self.url == other.url
    }

    pub fn matches(&self, method: &str, url: &str) -> bool {
        self.method.as_str() == method && self.url.as_str() == url
    }

    /// Label of this request in the tree for the given display pattern
    pub fn tree_label(&self, pattern: &str) -> String {
        crate::template::tree_label(self, pattern)
    }

    /// One-line description used in logs
    pub fn to_log(&self, url: &Url) -> String {
        format!("{} {}", self.method, url)
    }
}

/// Tree display settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "Pattern", default, deserialize_with = "null_as_default")]
    pub pattern: String,
}

/// A request after template resolution, ready for the transport
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRequest {
    pub method: Method,
    pub url: Url,
    pub content_type: String,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// What the transport reports back for a completed exchange
#[derive(Clone, Debug, Default)]
pub struct Exchange {
    pub method: String,
    pub url: String,
    pub host: String,
    pub status: String,
    pub status_code: u16,
    pub http_version: String,
    pub content_length: Option<u64>,
    pub content_type: String,
    pub request_headers: HeaderMap,
    pub response_headers: HeaderMap,
    pub request_body: String,
    pub body: String,
    pub time_ms: u64,
}

/// Log levels surfaced in the log panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// A line in the in-app log
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

/// Deserialize `null` as the type's default (documents may carry `null` collections)
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
