// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI flag surface (spec.md §6) and post-parse validation (spec.md §7's
//! "Configuration" error kind).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::agent_type::AgentType;
use crate::pty::{DEFAULT_COLS, DEFAULT_ROWS, MIN_COLS, MIN_ROWS};

#[derive(Debug, Parser)]
#[command(name = "agentapi", version, about = "Exposes an interactive terminal AI coding agent as an HTTP conversation service.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch an agent binary and serve the conversation API over HTTP.
    Server(ServerConfig),
    /// Attach an interactive terminal client to a running server.
    Attach(AttachArgs),
}

#[derive(Debug, Parser)]
pub struct ServerConfig {
    /// Agent type; selects screen-handling heuristics. Unrecognized values
    /// fall back to `custom`.
    #[arg(long = "type", env = "AGENTAPI_TYPE", default_value = "custom")]
    pub agent_type: String,

    /// HTTP port to listen on.
    #[arg(long, env = "AGENTAPI_PORT", default_value = "3284")]
    pub port: u16,

    /// Pseudo-terminal width in columns.
    #[arg(long = "term-width", env = "AGENTAPI_TERM_WIDTH", default_value_t = DEFAULT_COLS)]
    pub term_width: u16,

    /// Pseudo-terminal height in rows.
    #[arg(long = "term-height", env = "AGENTAPI_TERM_HEIGHT", default_value_t = DEFAULT_ROWS)]
    pub term_height: u16,

    /// Base path the bundled chat UI is served under.
    #[arg(long = "chat-base-path", env = "AGENTAPI_CHAT_BASE_PATH", default_value = "/chat")]
    pub chat_base_path: String,

    /// Bare hostnames allowed in the `Host` header, or `*`.
    #[arg(long = "allowed-hosts", env = "AGENTAPI_ALLOWED_HOSTS", value_delimiter = ',', default_value = "localhost,127.0.0.1")]
    pub allowed_hosts: Vec<String>,

    /// `scheme://host[:port]` origins allowed by CORS, or `*`.
    #[arg(long = "allowed-origins", env = "AGENTAPI_ALLOWED_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub allowed_origins: Vec<String>,

    /// Text to send as the agent's first message once it is ready. If
    /// absent and stdin is not a TTY, read from stdin instead.
    #[arg(long = "initial-prompt", env = "AGENTAPI_INITIAL_PROMPT")]
    pub initial_prompt: Option<String>,

    /// Path to persist and/or restore conversation state.
    #[arg(long = "state-file", env = "AGENTAPI_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Restore conversation state from `--state-file` on startup.
    #[arg(long = "load-state", env = "AGENTAPI_LOAD_STATE")]
    pub load_state: bool,

    /// Persist conversation state to `--state-file` on shutdown.
    #[arg(long = "save-state", env = "AGENTAPI_SAVE_STATE")]
    pub save_state: bool,

    /// Write the server's PID to this file on startup.
    #[arg(long = "pid-file", env = "AGENTAPI_PID_FILE")]
    pub pid_file: Option<PathBuf>,

    /// Print the OpenAPI schema to stdout and exit.
    #[arg(long = "print-openapi")]
    pub print_openapi: bool,

    /// Log format: `json` or `text`.
    #[arg(long = "log-format", env = "AGENTAPI_LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long = "log-level", env = "AGENTAPI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Drive the agent over an ACP JSON-RPC stream instead of a PTY. Not
    /// part of spec.md's CLI table; left to implementers to choose a
    /// selector since the two Conversation variants share one contract.
    #[arg(long = "acp", env = "AGENTAPI_ACP")]
    pub acp: bool,

    /// `<agent-binary> [agent-args...]`, after `--`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub agent_command: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct AttachArgs {
    /// Base URL of a running `agentapi server`.
    #[arg(long, env = "AGENTAPI_URL", default_value = "http://127.0.0.1:3284")]
    pub url: String,
}

impl ServerConfig {
    /// Resolve `--type` into an [`AgentType`]. Unknown values are `Custom`
    /// rather than a validation error (spec.md §3).
    pub fn agent_type_enum(&self) -> AgentType {
        AgentType::parse(&self.agent_type)
    }

    /// Validate fatal startup conditions (spec.md §7 "Configuration" kind).
    /// `--print-openapi` is an early-exit flag and skips the transport
    /// presence check below — it never starts an agent.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.print_openapi {
            return Ok(());
        }

        if self.agent_command.is_empty() {
            anyhow::bail!("an agent binary is required after `--`");
        }

        for host in &self.allowed_hosts {
            if !is_valid_host_entry(host) {
                anyhow::bail!("invalid --allowed-hosts entry: {host:?}");
            }
        }
        for origin in &self.allowed_origins {
            if !is_valid_origin_entry(origin) {
                anyhow::bail!("invalid --allowed-origins entry: {origin:?}");
            }
        }

        if self.term_width < MIN_COLS || self.term_height < MIN_ROWS {
            anyhow::bail!(
                "terminal size must be at least {MIN_COLS}x{MIN_ROWS}, got {}x{}",
                self.term_width,
                self.term_height
            );
        }

        if (self.load_state || self.save_state) && self.state_file.is_none() {
            anyhow::bail!("--load-state/--save-state require --state-file");
        }

        Ok(())
    }
}

/// A bare hostname: no scheme, no port, no whitespace or commas. The
/// literal `"*"` is also accepted.
fn is_valid_host_entry(host: &str) -> bool {
    if host == "*" {
        return true;
    }
    !host.is_empty()
        && !host.contains("://")
        && !host.contains(':')
        && !host.contains(',')
        && !host.chars().any(char::is_whitespace)
}

/// A `scheme://host[:port]` origin, or the literal `"*"`.
fn is_valid_origin_entry(origin: &str) -> bool {
    if origin == "*" {
        return true;
    }
    let Some((scheme, rest)) = origin.split_once("://") else {
        return false;
    };
    !scheme.is_empty() && !rest.is_empty() && !rest.chars().any(char::is_whitespace)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
