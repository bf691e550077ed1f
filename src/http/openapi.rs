// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::Json;
use serde_json::{json, Value};

/// `GET /openapi.json`: a minimal machine-readable schema of the
/// conversation surface (spec.md §6). `/internal/screen` is intentionally
/// absent — it backs the bundled chat UI, not public integrations.
pub async fn openapi_json() -> Json<Value> {
    Json(spec())
}

/// Exposed for `--print-openapi`, which prints this schema to stdout and
/// exits without starting the server.
pub fn schema() -> Value {
    spec()
}

fn spec() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": { "title": "agentapi", "version": "1" },
        "paths": {
            "/status": {
                "get": {
                    "summary": "Current conversation status",
                    "responses": { "200": { "description": "status" } }
                }
            },
            "/messages": {
                "get": {
                    "summary": "Full message history",
                    "responses": { "200": { "description": "messages" } }
                }
            },
            "/message": {
                "post": {
                    "summary": "Send a user message, or write raw bytes",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "type": { "type": "string", "enum": ["user", "raw"] },
                                        "content": { "type": "string" }
                                    },
                                    "required": ["type", "content"]
                                }
                            }
                        }
                    },
                    "responses": {
                        "204": { "description": "accepted" },
                        "400": { "description": "whitespace, empty, or malformed" },
                        "409": { "description": "conversation is changing" }
                    }
                }
            },
            "/events": {
                "get": {
                    "summary": "Server-sent events: message/status/error",
                    "responses": { "200": { "description": "text/event-stream" } }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "openapi_tests.rs"]
mod tests;
