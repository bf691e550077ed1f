// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process orchestration (spec.md §6 CLI, §5 "Cancellation"): spawns the
//! TerminalProcess or ACP worker, wires up the EventEmitter and HTTP
//! surface, installs signal handlers, and drives the graceful-shutdown
//! sequence. `config.rs` owns flag parsing and validation; this module
//! owns what happens once a validated [`ServerConfig`] is in hand.

use std::io::{IsTerminal, Read};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::conversation::acp::AcpConversation;
use crate::conversation::clock::RealClock;
use crate::conversation::pty::PtyConversation;
use crate::conversation::{self, Conversation, StatePersistence};
use crate::emitter::EventEmitter;
use crate::http::{self, AppState};
use crate::message::MessagePart;
use crate::pty::spawn::NativePty;
use crate::pty::{ExitStatus, TerminalProcess, WaitError};

/// Screen polling cadence. Not a flag in spec.md's CLI table; spec.md §4.4's
/// documented default.
const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(25);
/// How long the screen must be unchanged before the conversation is
/// considered stable. spec.md §4.4's documented default.
const SCREEN_STABILITY_LENGTH: Duration = Duration::from_secs(2);
/// The 5 s graceful deadlines from spec.md §5's Cancellation paragraph.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// Launch one agent session and block until it is told to stop. Returns an
/// error only for conditions spec.md §6 maps to exit code 1 (an unclean
/// shutdown); `main` is responsible for turning that into `process::exit`.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    if config.print_openapi {
        println!("{}", serde_json::to_string_pretty(&http::openapi_schema())?);
        return Ok(());
    }

    if let Some(path) = &config.pid_file {
        write_pid_file(path)?;
    }

    let agent_type = config.agent_type_enum();
    let emitter = Arc::new(EventEmitter::new(Box::new(RealClock)));
    let initial_prompt = resolve_initial_prompt(config.initial_prompt.clone())?;

    let conversation_config = conversation::Config {
        agent_type,
        clock: Arc::new(RealClock),
        snapshot_interval: SNAPSHOT_INTERVAL,
        screen_stability_length: SCREEN_STABILITY_LENGTH,
        initial_prompt,
        state_persistence: StatePersistence {
            state_file: config.state_file.clone(),
            load_on_start: config.load_state,
            save_on_stop: config.save_state,
        },
    };

    // The root token: only cancelled as the last step of shutdown, once the
    // HTTP listener and the terminal have already stopped. Conversation
    // internals use it to answer every blocked waiter with a cancel error.
    let root_shutdown = CancellationToken::new();
    // A separate token driving axum's graceful shutdown; cancelled earlier,
    // right after state has been saved.
    let http_shutdown = CancellationToken::new();
    // Flipped by either a signal or the child process exiting, to wake the
    // shutdown sequence below.
    let trigger = CancellationToken::new();

    let (conversation, terminal, transport): (Arc<dyn Conversation>, Option<Arc<dyn TerminalProcess>>, &'static str) =
        if config.acp {
            let project_root = std::env::current_dir()?;
            let acp = AcpConversation::new(
                config.agent_command.clone(),
                project_root,
                conversation_config,
                emitter.clone(),
                root_shutdown.clone(),
            );
            (Arc::new(acp), None, "acp")
        } else {
            let terminal: Arc<dyn TerminalProcess> =
                Arc::new(NativePty::spawn(&config.agent_command, config.term_width, config.term_height)?);
            let pty = PtyConversation::new(conversation_config, terminal.clone(), emitter.clone(), root_shutdown.clone());
            (Arc::new(pty), Some(terminal), "pty")
        };

    let app_state = Arc::new(AppState {
        conversation: conversation.clone(),
        emitter: emitter.clone(),
        agent_type,
        transport,
        chat_base_path: config.chat_base_path.clone(),
        allowed_hosts: config.allowed_hosts.clone(),
        auth_token: std::env::var("AGENTAPI_KEY").ok(),
    });

    let router = http::build_router(app_state, &config.allowed_origins);
    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(addr = %listener.local_addr()?, "HTTP listening");

    let conversation_loop = {
        let conversation = conversation.clone();
        tokio::spawn(async move { conversation.start().await })
    };

    let http_task = {
        let http_shutdown = http_shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).with_graceful_shutdown(http_shutdown.cancelled_owned()).await
        })
    };

    let signal_task = tokio::spawn(signal_loop(trigger.clone(), conversation.clone()));

    let exit_code = tokio::select! {
        _ = trigger.cancelled() => 0,
        outcome = wait_for_child(terminal.as_ref()) => report_child_exit(outcome),
    };

    // (1) SaveState("shutdown").
    conversation.save_state("shutdown").await;

    // (2) Stop the HTTP listener with a graceful deadline.
    http_shutdown.cancel();
    match tokio::time::timeout(SHUTDOWN_DEADLINE, http_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!(error = %e, "HTTP server error"),
        Ok(Err(e)) => error!(error = %e, "HTTP server task panicked"),
        Err(_) => warn!("HTTP listener did not stop within its graceful deadline"),
    }

    // (3) Close the TerminalProcess with a deadline (no-op for ACP).
    if let Some(terminal) = &terminal {
        terminal.close(SHUTDOWN_DEADLINE).await;
    }

    // (4) Cancel the root context; the snapshot/send loops exit and the
    // send loop drains its queue, answering every waiter with the cancel
    // error.
    root_shutdown.cancel();
    let _ = tokio::time::timeout(SHUTDOWN_DEADLINE, conversation_loop).await;
    signal_task.abort();

    if exit_code != 0 {
        anyhow::bail!("agent process exited with a failure status");
    }
    Ok(())
}

/// Waits for the child process to exit. Never resolves for the ACP variant
/// (there is no child to wait on; only signals or the HTTP surface end it).
async fn wait_for_child(terminal: Option<&Arc<dyn TerminalProcess>>) -> Result<ExitStatus, WaitError> {
    match terminal {
        Some(terminal) => terminal.wait().await,
        None => std::future::pending().await,
    }
}

/// Turn a [`TerminalProcess::wait`] outcome into an exit code, logging a
/// non-zero exit with its trailing screen per spec.md §7's "child process
/// exit" error kind.
fn report_child_exit(outcome: Result<ExitStatus, WaitError>) -> i32 {
    match outcome {
        Ok(status) if status.is_success() => 0,
        Ok(status) => {
            error!(?status, "agent process exited with a non-zero status");
            1
        }
        Err(WaitError::NonZeroExit { status, trailing_screen }) => {
            error!(?status, screen = %trailing_screen, "agent process exited with a non-zero status");
            1
        }
        Err(WaitError::Io(e)) => {
            error!(error = %e, "failed waiting for the agent process");
            1
        }
    }
}

/// Signal handling per spec.md §6: `SIGINT`/`SIGTERM`/`SIGHUP` cancel
/// `trigger` to start a graceful stop; a second such signal forces an
/// immediate exit. `SIGUSR1` saves state without shutting down. Windows
/// only has `SIGINT`/`SIGTERM`.
#[cfg(unix)]
async fn signal_loop(trigger: CancellationToken, conversation: Arc<dyn Conversation>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint, mut sighup, mut sigusr1) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
        signal(SignalKind::hangup()),
        signal(SignalKind::user_defined1()),
    ) {
        (Ok(a), Ok(b), Ok(c), Ok(d)) => (a, b, c, d),
        _ => {
            error!("failed to install signal handlers");
            return;
        }
    };

    let reason = loop {
        tokio::select! {
            _ = sigterm.recv() => break "SIGTERM",
            _ = sigint.recv() => break "SIGINT",
            _ = sighup.recv() => break "SIGHUP",
            _ = sigusr1.recv() => {
                info!("received SIGUSR1, saving state without exiting");
                conversation.save_state("SIGUSR1").await;
            }
        }
    };
    info!(signal = reason, "received shutdown signal");
    trigger.cancel();

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
        _ = sighup.recv() => {}
    }
    warn!("received a second shutdown signal, forcing exit");
    std::process::exit(130);
}

#[cfg(not(unix))]
async fn signal_loop(trigger: CancellationToken, _conversation: Arc<dyn Conversation>) {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("failed to install Ctrl-C handler");
        return;
    }
    info!("received Ctrl-C");
    trigger.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("received a second shutdown signal, forcing exit");
        std::process::exit(130);
    }
}

/// `--initial-prompt`, else stdin when it is not a TTY, else none.
fn resolve_initial_prompt(flag: Option<String>) -> anyhow::Result<Vec<MessagePart>> {
    if let Some(text) = flag {
        return Ok(vec![MessagePart::text(text)]);
    }
    if std::io::stdin().is_terminal() {
        return Ok(Vec::new());
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![MessagePart::text(buf)])
}

/// Write the server's own PID to `path`, overwriting any existing file.
fn write_pid_file(path: &std::path::Path) -> anyhow::Result<()> {
    std::fs::write(path, std::process::id().to_string())?;
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
