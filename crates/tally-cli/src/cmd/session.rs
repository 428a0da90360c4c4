//! Interactive session.
//!
//! One controller lives for the whole session. Each command runs as its own
//! task so input keeps flowing while an operation is in flight; commands that
//! arrive while the controller is busy are dropped by the controller.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use solana_sdk::signature::read_keypair_file;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use tally_core::chain::WalletSigner;

use crate::args::Cli;
use crate::cmd::{self, decrement};
use crate::output;
use crate::solana::client::{self, Controller};

const HELP: &str = "commands: + | - | init | sync | connect <keypair> | disconnect | help | quit";

pub async fn run(cli: &Cli) -> Result<()> {
    let (ctl, synced) = client::connect(cli).await?;
    if let Err(e) = synced {
        output::eprintln_line(&format!("initial sync failed ({}): {e}", e.kind().as_str()));
    }
    let ctl = Arc::new(ctl);
    output::render(ctl.phase(), &ctl.state())?;
    output::eprintln_line(HELP);

    let mut tasks = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            continue;
        };

        match word {
            "q" | "quit" | "exit" => break,
            "h" | "help" => output::eprintln_line(HELP),
            "+" | "inc" | "increment" => {
                let ctl = ctl.clone();
                tasks.spawn(async move {
                    let result = ctl.increment_counter().await;
                    show(cmd::report(&ctl, "increment", &result));
                });
            }
            "-" | "dec" | "decrement" => {
                let ctl = ctl.clone();
                tasks.spawn(async move {
                    match decrement::execute(&ctl).await {
                        Ok(result) => show(cmd::report(&ctl, "decrement", &result)),
                        Err(e) => show(Err(e)),
                    }
                });
            }
            "init" => {
                let ctl = ctl.clone();
                tasks.spawn(async move {
                    let result = ctl.initialize_counter().await;
                    show(cmd::report(&ctl, "init", &result));
                });
            }
            "s" | "sync" | "status" => {
                let ctl = ctl.clone();
                tasks.spawn(async move {
                    if let Err(e) = ctl.sync().await {
                        output::eprintln_line(&format!("sync failed: {e}"));
                    }
                    show(output::render(ctl.phase(), &ctl.state()));
                });
            }
            "connect" => match words.next().map(load_wallet) {
                Some(Ok(signer)) => switch_signer(&ctl, Some(signer)).await,
                Some(Err(e)) => output::eprintln_line(&format!("connect failed: {e:#}")),
                None => output::eprintln_line("usage: connect <keypair>"),
            },
            "disconnect" => switch_signer(&ctl, None).await,
            other => output::eprintln_line(&format!("unknown command `{other}`; {HELP}")),
        }

        // Reap finished tasks so the set does not grow for the whole session.
        while tasks.try_join_next().is_some() {}
    }

    // No cancellation: in-flight operations run to completion.
    while tasks.join_next().await.is_some() {}
    Ok(())
}

fn load_wallet(path: &str) -> Result<Arc<WalletSigner>> {
    let keypair = read_keypair_file(path).map_err(|e| anyhow!("{path}: {e}"))?;
    let signer: Arc<WalletSigner> = Arc::new(keypair);
    Ok(signer)
}

async fn switch_signer(ctl: &Controller, signer: Option<Arc<WalletSigner>>) {
    if let Err(e) = ctl.set_signer(signer).await {
        output::eprintln_line(&format!("sync after wallet change failed: {e}"));
    }
    show(output::render(ctl.phase(), &ctl.state()));
}

fn show(result: Result<()>) {
    if let Err(e) = result {
        output::eprintln_line(&format!("output error: {e:#}"));
    }
}
