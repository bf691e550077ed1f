// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real PTY-backed [`TerminalProcess`] via `forkpty`.

use std::ffi::CString;
use std::future::Future;
use std::os::fd::AsRawFd;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use nix::libc;
use nix::pty::{forkpty, ForkptyResult, Winsize};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, ForkResult, Pid};
use parking_lot::Mutex;
use tokio::io::unix::AsyncFd;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tracing::{debug, warn};

use super::nbio::{read_chunk, set_nonblocking, write_all, PtyFd};
use super::screen::TerminalScreen;
use super::{ExitStatus, TerminalProcess, WaitError};

/// Native PTY backend that spawns a child process via `forkpty`.
pub struct NativePty {
    master: Arc<AsyncFd<PtyFd>>,
    child_pid: Pid,
    write_lock: AsyncMutex<()>,
    screen: Arc<Mutex<TerminalScreen>>,
    exit_status: Arc<Mutex<Option<ExitStatus>>>,
    exited: Arc<Notify>,
}

impl NativePty {
    /// Spawn `command` (must have at least one element) on a new PTY with
    /// the given dimensions, enforcing the `10x10` minimum from spec.md §4.1.
    // forkpty requires unsafe: post-fork child is partially initialized.
    #[allow(unsafe_code)]
    pub fn spawn(command: &[String], cols: u16, rows: u16) -> anyhow::Result<Self> {
        anyhow::ensure!(!command.is_empty(), "command must have at least one argument");
        let cols = cols.max(super::MIN_COLS);
        let rows = rows.max(super::MIN_ROWS);

        let winsize = Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };

        // SAFETY: forkpty is unsafe because the child is partially
        // initialized after fork; we immediately exec.
        let result = unsafe { forkpty(&winsize, None) }.context("forkpty failed")?;
        let ForkptyResult { master, fork_result } = result;

        match fork_result {
            ForkResult::Child => {
                std::env::set_var("TERM", "xterm-256color");
                let c_args: Vec<CString> = command
                    .iter()
                    .map(|s| CString::new(s.as_bytes()))
                    .collect::<Result<_, _>>()
                    .context("invalid command argument")?;
                execvp(&c_args[0], &c_args).context("execvp failed")?;
                unreachable!("execvp does not return on success");
            }
            ForkResult::Parent { child } => {
                set_nonblocking(&master)?;
                let afd = Arc::new(AsyncFd::new(PtyFd(master)).context("AsyncFd::new failed")?);
                let screen = Arc::new(Mutex::new(TerminalScreen::new(cols, rows)));
                let exit_status = Arc::new(Mutex::new(None));
                let exited = Arc::new(Notify::new());

                spawn_reader(afd.clone(), child, screen.clone(), exit_status.clone(), exited.clone());

                Ok(Self {
                    master: afd,
                    child_pid: child,
                    write_lock: AsyncMutex::new(()),
                    screen,
                    exit_status,
                    exited,
                })
            }
        }
    }
}

/// Continuously read PTY output into `screen` until EOF, then reap the
/// child and record its exit status.
fn spawn_reader(
    master: Arc<AsyncFd<PtyFd>>,
    pid: Pid,
    screen: Arc<Mutex<TerminalScreen>>,
    exit_status: Arc<Mutex<Option<ExitStatus>>>,
    exited: Arc<Notify>,
) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 8192];
        loop {
            match read_chunk(&master, &mut buf).await {
                Ok(0) => break,
                Ok(n) => screen.lock().feed(&buf[..n]),
                Err(e) if e.raw_os_error() == Some(libc::EIO) => break,
                Err(e) => {
                    warn!(error = %e, "pty read failed");
                    break;
                }
            }
        }

        let status = tokio::task::spawn_blocking(move || wait_for_exit(pid))
            .await
            .unwrap_or(Err(anyhow::anyhow!("wait thread panicked")));

        match status {
            Ok(s) => *exit_status.lock() = Some(s),
            Err(e) => warn!(error = %e, "waitpid failed"),
        }
        exited.notify_waiters();
    });
}

fn wait_for_exit(pid: Pid) -> anyhow::Result<ExitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus { code: Some(code), signal: None }),
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                return Ok(ExitStatus { code: None, signal: Some(sig as i32) })
            }
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => anyhow::bail!("waitpid failed: {e}"),
        }
    }
}

impl TerminalProcess for NativePty {
    fn write<'a>(&'a self, bytes: Bytes) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            write_all(&self.master, &bytes).await.context("pty write failed")
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

    fn close<'a>(&'a self, timeout: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if self.exit_status.lock().is_some() {
                return;
            }

            debug!(pid = self.child_pid.as_raw(), "sending SIGHUP to child");
            // ESRCH ("no such process") means the child already exited —
            // that's success for our purposes.
            let _ = kill(self.child_pid, Signal::SIGHUP);

            let voluntary_exit = tokio::time::timeout(timeout, self.exited.notified()).await;
            if voluntary_exit.is_err() {
                debug!(pid = self.child_pid.as_raw(), "force-killing child after timeout");
                let _ = kill(self.child_pid, Signal::SIGKILL);
                let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
            }
        })
    }

    fn resize(&self, cols: u16, rows: u16) -> anyhow::Result<()> {
        let cols = cols.max(super::MIN_COLS);
        let rows = rows.max(super::MIN_ROWS);
        self.screen.lock().resize(cols, rows);

        let ws = Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };
        // SAFETY: TIOCSWINSZ is a well-defined ioctl setting the PTY's
        // window size; `ws` is a properly initialized Winsize.
        #[allow(unsafe_code)]
        let ret = unsafe { libc::ioctl(self.master.as_raw_fd(), libc::TIOCSWINSZ, &ws) };
        anyhow::ensure!(ret >= 0, "TIOCSWINSZ ioctl failed: {}", std::io::Error::last_os_error());
        Ok(())
    }
}

impl Drop for NativePty {
    fn drop(&mut self) {
        if self.exit_status.lock().is_none() {
            let _ = kill(self.child_pid, Signal::SIGKILL);
            let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
        }
    }
}
