use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use tally_core::controller::{decrement_increments, Outcome, Phase};
use tally_core::TallyResult;

use crate::args::Cli;
use crate::cmd;
use crate::output;
use crate::solana::client::Controller;

pub async fn run(cli: &Cli) -> Result<()> {
    let ctl = cmd::connect_for(cli, "decrement").await?;
    let result = execute(&ctl).await?;
    cmd::finish(&ctl, "decrement", result)
}

/// Run the decrement emulation with a progress bar on stderr.
pub async fn execute(ctl: &Controller) -> Result<TallyResult<Outcome>> {
    if let (Phase::Ready(n), false) = (ctl.phase(), output::is_json()) {
        if n > 0 {
            output::eprintln_line(&format!(
                "decrement from {n} sends {} increment transactions",
                decrement_increments(n)
            ));
        }
    }

    let pb = if output::is_json() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(ProgressStyle::with_template(
            "{spinner} [{bar:40}] {pos}/{len} increments ({eta})",
        )?);
        pb
    };

    let result = ctl
        .decrement_counter_with(|p| {
            pb.set_length(p.required);
            pb.set_position(p.completed);
        })
        .await;
    pb.finish_and_clear();
    Ok(result)
}
