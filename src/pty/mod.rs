// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TerminalProcess: launches a child program attached to a pseudo-terminal
//! and exposes the four operations spec.md §4.1 defines. See [`spawn`] for
//! the real `forkpty`-backed implementation and [`fake`] for the
//! in-memory test double.

pub mod fake;
pub mod screen;
pub mod spawn;

mod nbio;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Minimum terminal dimensions spec.md §4.1 allows.
pub const MIN_COLS: u16 = 10;
pub const MIN_ROWS: u16 = 10;
/// Default terminal dimensions.
pub const DEFAULT_COLS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 1000;

/// Exit status of the child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Error from [`TerminalProcess::wait`].
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The child exited with a non-zero status. Carries the trailing
    /// screen contents per spec.md §7's "child process exit" error kind.
    #[error("child process exited with status {status:?}")]
    NonZeroExit { status: ExitStatus, trailing_screen: String },
    #[error("failed to wait for child: {0}")]
    Io(#[source] anyhow::Error),
}

/// A pseudo-terminal-driven child process. Object-safe so the real
/// `forkpty`-backed [`spawn::NativePty`] and the in-memory
/// [`fake::FakeTerminal`] can be used interchangeably behind `Arc<dyn
/// TerminalProcess>`.
pub trait TerminalProcess: Send + Sync {
    /// Deliver raw bytes to the terminal unchanged. Concurrent callers are
    /// serialized internally.
    fn write<'a>(&'a self, bytes: Bytes) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    /// The current rendered screen, newline-joined.
    fn read_screen(&self) -> String;

    /// Block until the child exits.
    fn wait<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<ExitStatus, WaitError>> + Send + 'a>>;

    /// Send an interrupt, wait up to `timeout` for voluntary exit, then
    /// force-kill and release the PTY. Succeeds even if the child already
    /// exited.
    fn close<'a>(&'a self, timeout: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Resize the underlying pseudo-terminal.
    fn resize(&self, cols: u16, rows: u16) -> anyhow::Result<()>;
}
