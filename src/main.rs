// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use agentapi::config::{Cli, Command};
use agentapi::{attach, lifecycle, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Attach(args) => {
            std::process::exit(attach::run(args).await);
        }
        Command::Server(config) => {
            if let Err(e) = config.validate() {
                eprintln!("error: {e}");
                std::process::exit(1);
            }

            logging::init(&config);

            match lifecycle::run(config).await {
                Ok(()) => std::process::exit(0),
                Err(e) => {
                    error!("fatal: {e:#}");
                    std::process::exit(1);
                }
            }
        }
    }
}
