// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`TerminalProcess`] double used by `conversation` and `http`
//! tests so they don't need a real child process or PTY.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::screen::TerminalScreen;
use super::{ExitStatus, TerminalProcess, WaitError};

/// Records every byte string handed to [`TerminalProcess::write`] and lets
/// a test push bytes onto the screen as if they had come from the child.
pub struct FakeTerminal {
    screen: Mutex<TerminalScreen>,
    writes: Mutex<Vec<Bytes>>,
    exit_status: Mutex<Option<ExitStatus>>,
    exited: Notify,
    closed: Mutex<bool>,
}

impl FakeTerminal {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            screen: Mutex::new(TerminalScreen::new(cols, rows)),
            writes: Mutex::new(Vec::new()),
            exit_status: Mutex::new(None),
            exited: Notify::new(),
            closed: Mutex::new(false),
        }
    }

    /// Feed bytes into the screen as if the child process had produced them.
    pub fn push_output(&self, data: &[u8]) {
        self.screen.lock().feed(data);
    }

    /// Every byte string passed to `write`, in call order.
    pub fn writes(&self) -> Vec<Bytes> {
        self.writes.lock().clone()
    }

    /// Simulate the child process exiting with `status`.
    pub fn exit(&self, status: ExitStatus) {
        *self.exit_status.lock() = Some(status);
        self.exited.notify_waiters();
    }

    pub fn was_closed(&self) -> bool {
        *self.closed.lock()
    }
}

impl TerminalProcess for FakeTerminal {
    fn write<'a>(&'a self, bytes: Bytes) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.writes.lock().push(bytes);
            Ok(())
        })
    }

    fn read_screen(&self) -> String {
        self.screen.lock().render()
    }

    fn wait<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<ExitStatus, WaitError>> + Send + 'a>> {
        Box::pin(async move {
            loop {
                if let Some(status) = *self.exit_status.lock() {
                    if status.is_success() {
                        return Ok(status);
                    }
                    return Err(WaitError::NonZeroExit {
                        status,
                        trailing_screen: self.read_screen(),
                    });
                }
                self.exited.notified().await;
            }
        })
    }

    fn close<'a>(&'a self, _timeout: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            *self.closed.lock() = true;
            if self.exit_status.lock().is_none() {
                self.exit(ExitStatus { code: Some(0), signal: None });
            }
        })
    }

    fn resize(&self, cols: u16, rows: u16) -> anyhow::Result<()> {
        self.screen.lock().resize(cols, rows);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
