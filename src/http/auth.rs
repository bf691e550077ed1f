// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::error::ErrorCode;

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn reject(code: ErrorCode, message: impl Into<String>) -> Response {
    let status = StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(ErrorBody { error: code.as_str(), message: message.into() })).into_response()
}

/// Paths exempt from bearer authentication (spec.md §6 "Authentication").
fn is_auth_exempt(path: &str) -> bool {
    path == "/" || path == "/openapi.json" || path.starts_with("/chat/") || path.starts_with("/docs")
}

/// Constant-time comparison to avoid a timing side channel on the token.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Find and percent-decode a single query parameter without pulling in a
/// URL-encoding crate.
fn find_query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| percent_decode(v))
    })
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok().and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Require the `Host` header's hostname to appear in `allowed_hosts`, or
/// `*` to be present (spec.md §6 "Host guard").
pub async fn host_guard(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    if state.allowed_hosts.iter().any(|h| h == "*") {
        return next.run(req).await;
    }

    let Some(host_header) = req.headers().get(axum::http::header::HOST).and_then(|v| v.to_str().ok()) else {
        return reject(ErrorCode::ForbiddenHost, "missing Host header");
    };
    let hostname = host_header.split(':').next().unwrap_or(host_header).to_lowercase();

    if state.allowed_hosts.iter().any(|h| h.to_lowercase() == hostname) {
        next.run(req).await
    } else {
        reject(ErrorCode::ForbiddenHost, format!("host {hostname:?} is not in the allow-list"))
    }
}

/// Enforce `Authorization: Bearer <key>` when `AGENTAPI_KEY` is configured.
/// `/events` additionally accepts `?api_key=<key>` since `EventSource`
/// cannot set headers (spec.md §6 "Authentication").
pub async fn auth_guard(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(req).await;
    };

    let path = req.uri().path();
    if is_auth_exempt(path) {
        return next.run(req).await;
    }

    let bearer_ok = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| constant_time_eq(token, expected));

    let query_ok = path == "/events"
        && req.uri().query().and_then(|q| find_query_param(q, "api_key")).is_some_and(|token| constant_time_eq(&token, expected));

    if bearer_ok || query_ok {
        next.run(req).await
    } else {
        reject(ErrorCode::Unauthorized, "missing or incorrect bearer token")
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
