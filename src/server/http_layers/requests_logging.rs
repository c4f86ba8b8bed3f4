//! Per-request logging, plus the HTTP metrics that need the same timing.

use super::super::metrics::record_http_request;
use super::super::state::ServerState;
use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{error, info};

/// How much of each exchange is written to the log. Every level includes
/// everything the previous one logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    #[default]
    Path,
    Headers,
    Body,
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestsLoggingLevel::None => "none",
            RequestsLoggingLevel::Path => "path",
            RequestsLoggingLevel::Headers => "headers",
            RequestsLoggingLevel::Body => "body",
        };
        f.write_str(name)
    }
}

const MAX_LOGGABLE_BODY_LENGTH: usize = 1024;

/// Metrics label for requests no route matched, which only reach the fallback.
pub const UNMATCHED_ROUTE: &str = "unmatched";

fn content_length(headers: &HeaderMap) -> Result<usize, &'static str> {
    let value = headers.get(CONTENT_LENGTH).ok_or("no content-length")?;
    value
        .to_str()
        .map_err(|_| "unreadable content-length")?
        .parse()
        .map_err(|_| "non-numeric content-length")
}

fn log_headers(direction: &str, headers: &HeaderMap) {
    for (name, value) in headers {
        info!("  {} {}: {:?}", direction, name, value);
    }
}

/// Logs a body small enough to be buffered and returns an equivalent one.
async fn log_body(direction: &str, headers: &HeaderMap, body: Body) -> Result<Body, StatusCode> {
    let size = match content_length(headers) {
        Ok(size) => size,
        Err(reason) => {
            info!("  {} body not logged: {}", direction, reason);
            return Ok(body);
        }
    };
    if size >= MAX_LOGGABLE_BODY_LENGTH {
        info!(
            "  {} body not logged: {:#} is too big",
            direction,
            byte_unit::Byte::from(size)
        );
        return Ok(body);
    }

    let bytes = axum::body::to_bytes(body, size).await.map_err(|err| {
        error!("Could not buffer {} body: {}", direction, err);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    info!("  {} body: {}", direction, String::from_utf8_lossy(&bytes));
    Ok(Body::from(bytes))
}

pub async fn log_requests(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    let level = state.config.requests_logging_level;
    let started = Instant::now();

    let method = request.method().clone();
    let request_path = request.uri().path().to_owned();
    // Metrics are labelled by route template, never by raw path, so that
    // neither ids nor arbitrary 404 paths grow the series count.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    if level >= RequestsLoggingLevel::Path {
        info!("--> {} {}", method, request.uri());
    }
    if level >= RequestsLoggingLevel::Headers {
        log_headers("-->", request.headers());
    }
    let request = if level >= RequestsLoggingLevel::Body {
        let (parts, body) = request.into_parts();
        match log_body("-->", &parts.headers, body).await {
            Ok(body) => Request::from_parts(parts, body),
            Err(status) => return status.into_response(),
        }
    } else {
        request
    };

    let response = next.run(request).await;

    if level >= RequestsLoggingLevel::Headers {
        log_headers("<--", response.headers());
    }
    let response = if level >= RequestsLoggingLevel::Body {
        let (parts, body) = response.into_parts();
        match log_body("<--", &parts.headers, body).await {
            Ok(body) => Response::from_parts(parts, body),
            Err(status) => return status.into_response(),
        }
    } else {
        response
    };

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    if level >= RequestsLoggingLevel::Path {
        info!(
            "<-- {} {} {} in {}ms",
            status,
            method,
            request_path,
            elapsed.as_millis()
        );
    }
    record_http_request(method.as_str(), &route, status, elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_cumulative() {
        assert_eq!(RequestsLoggingLevel::default(), RequestsLoggingLevel::Path);
        assert!(RequestsLoggingLevel::None < RequestsLoggingLevel::Path);
        assert!(RequestsLoggingLevel::Headers < RequestsLoggingLevel::Body);
        assert_eq!(RequestsLoggingLevel::Headers.to_string(), "headers");
    }

    #[test]
    fn content_length_is_parsed() {
        let mut headers = HeaderMap::new();
        assert!(content_length(&headers).is_err());

        headers.insert(CONTENT_LENGTH, "42".parse().unwrap());
        assert_eq!(content_length(&headers), Ok(42));

        headers.insert(CONTENT_LENGTH, "many".parse().unwrap());
        assert!(content_length(&headers).is_err());
    }

    #[tokio::test]
    async fn small_bodies_are_handed_back_intact() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, "5".parse().unwrap());
        let body = log_body("-->", &headers, Body::from("hello")).await.unwrap();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }
}
