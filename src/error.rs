// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error codes shared across the HTTP surface and the conversation
/// layer. Every fallible operation a client can observe resolves to one of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// `POST /message` content is non-empty but differs from its trimmed form.
    Whitespace,
    /// `POST /message` content is empty after validation.
    Empty,
    /// `POST /message` was submitted while the conversation is not stable.
    Changing,
    /// The terminal process has already exited.
    Exited,
    /// Writing to or stabilizing the terminal failed.
    TerminalIo,
    /// Missing or incorrect bearer token.
    Unauthorized,
    /// Malformed request body or query parameters.
    BadRequest,
    /// `Host` header not present in the configured allow-list.
    ForbiddenHost,
    /// Unexpected internal failure.
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Whitespace | Self::Empty | Self::BadRequest => 400,
            Self::Changing => 409,
            Self::Exited => 410,
            Self::TerminalIo => 502,
            Self::Unauthorized => 401,
            Self::ForbiddenHost => 400,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
            Self::Empty => "empty",
            Self::Changing => "changing",
            Self::Exited => "exited",
            Self::TerminalIo => "terminal_io",
            Self::Unauthorized => "unauthorized",
            Self::BadRequest => "bad_request",
            Self::ForbiddenHost => "forbidden_host",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error paired with a human-readable message, convertible to an HTTP
/// JSON error body.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
