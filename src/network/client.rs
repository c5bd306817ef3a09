//! HTTP client wrapper - executes resolved requests and describes the exchange

use std::time::{Duration, Instant};

use crate::messages::NetworkResponse;
use crate::models::{Exchange, HeaderMap, LogLevel, ResolvedRequest};

const BINARY_BODY: &str = "NOTE: binary data not shown in terminal";

/// Create an HTTP client with the configured request timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Execute a resolved request. Progress and failures are reported through `logger`.
pub async fn execute_request<L>(
    client: &reqwest::Client,
    request: ResolvedRequest,
    request_id: u64,
    log_bodies: bool,
    logger: L,
) -> NetworkResponse
where
    L: Fn(LogLevel, String),
{
    let start = Instant::now();
    let failed = |message: String| NetworkResponse::Failed {
        id: request_id,
        message,
        time_ms: start.elapsed().as_millis() as u64,
    };

    logger(
        LogLevel::Debug,
        format!("{} {}", request.method, request.url),
    );

    let method = match reqwest::Method::from_bytes(request.method.as_str().as_bytes()) {
        Ok(method) => method,
        Err(e) => {
            logger(LogLevel::Error, "Impossible to build the query.".to_string());
            return failed(format!("Invalid method '{}': {}", request.method, e));
        }
    };

    let mut builder = client
        .request(method, request.url.as_str())
        .header(reqwest::header::CONTENT_TYPE, request.content_type.as_str());
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    if !request.body.is_empty() {
        builder = builder.body(request.body.clone());
    }

    let http_request = match builder.build() {
        Ok(http_request) => http_request,
        Err(e) => {
            logger(LogLevel::Error, "Impossible to build the query.".to_string());
            return failed(format!("Invalid request: {}", e));
        }
    };

    let host = http_request.url().host_str().unwrap_or_default().to_string();
    let request_headers = header_map(http_request.headers());
    let request_body = http_request
        .body()
        .and_then(reqwest::Body::as_bytes)
        .map(printable_body)
        .unwrap_or_default();

    let response = match client.execute(http_request).await {
        Ok(response) => response,
        Err(e) => {
            logger(LogLevel::Error, "Impossible to execute the query.".to_string());
            let message = if e.is_timeout() {
                format!("Request timed out: {}", e)
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                format!("Request failed: {}", e)
            };
            return failed(message);
        }
    };

    let status = response.status();
    let http_version = format!("{:?}", response.version());
    let content_length = response.content_length();
    let response_headers = header_map(response.headers());
    let content_type = response_headers
        .get("content-type")
        .cloned()
        .unwrap_or_default();

    logger(
        LogLevel::Debug,
        format!("Request header: {:?}", request_headers),
    );
    logger(
        LogLevel::Debug,
        format!("Response header: {:?}", response_headers),
    );

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            logger(
                LogLevel::Error,
                "Impossible to read the response body.".to_string(),
            );
            return failed(format!("Error reading body: {}", e));
        }
    };
    let body = format_body(&bytes);
    if log_bodies {
        logger(LogLevel::Debug, format!("Response body: {}", body));
    }

    NetworkResponse::Completed {
        id: request_id,
        exchange: Exchange {
            method: request.method.to_string(),
            url: request.url.to_string(),
            host,
            status: status.to_string(),
            status_code: status.as_u16(),
            http_version,
            content_length,
            content_type,
            request_headers,
            response_headers,
            request_body,
            body,
            time_ms: start.elapsed().as_millis() as u64,
        },
    }
}

/// First value of each header, keyed by lowercase name
fn header_map(headers: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_string())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

fn printable_body(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => BINARY_BODY.to_string(),
    }
}

/// Pretty-print JSON bodies; other text as is
fn format_body(bytes: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(bytes) {
        if let Ok(pretty) = serde_json::to_string_pretty(&json) {
            return pretty;
        }
    }
    printable_body(bytes)
}
