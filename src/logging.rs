// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing/logging setup from [`crate::config::ServerConfig`].

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Initialize the global tracing subscriber. Uses `try_init` so it is safe
/// to call more than once (e.g. from tests).
pub fn init(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}
