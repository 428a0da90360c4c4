use anyhow::Result;
use serde::Serialize;

use tally_core::controller::{Outcome, Phase, SkipReason};
use tally_core::state::LocalCounterState;
use tally_core::TallyResult;

use crate::args::{Cli, Command};
use crate::output;
use crate::solana::client::{self, Controller};

mod address;
mod decrement;
mod increment;
mod init;
mod schema;
mod session;
mod status;

pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Status => status::run(&cli).await,
        Command::Init => init::run(&cli).await,
        Command::Increment => increment::run(&cli).await,
        Command::Decrement => decrement::run(&cli).await,
        Command::Session => session::run(&cli).await,
        Command::Address => address::run(&cli),
        Command::Schema => schema::run(),
    }
}

#[derive(Debug, Serialize)]
pub struct OpOut {
    pub ok: bool,
    pub op: &'static str,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub phase: Phase,
    pub state: LocalCounterState,
}

/// Connect for a one-shot operation.
///
/// A failed initial sync fails the operation: the guard would otherwise see an
/// unknown phase and skip, hiding the cause.
pub async fn connect_for(cli: &Cli, op: &'static str) -> Result<Controller> {
    let (ctl, synced) = client::connect(cli).await?;
    match synced {
        Ok(_) => Ok(ctl),
        Err(e) => finish(&ctl, op, Err(e)).map(|()| ctl),
    }
}

/// Print the outcome of one controller operation followed by the current view.
pub fn report(ctl: &Controller, op: &'static str, result: &TallyResult<Outcome>) -> Result<()> {
    let mut out = OpOut {
        ok: result.is_ok(),
        op,
        applied: false,
        skipped: None,
        error_kind: None,
        error: None,
        phase: ctl.phase(),
        state: ctl.state(),
    };
    match result {
        Ok(Outcome::Applied(_)) => out.applied = true,
        Ok(Outcome::Skipped(reason)) => out.skipped = Some(*reason),
        Err(e) => {
            out.error_kind = Some(e.kind().as_str());
            out.error = Some(e.to_string());
        }
    }

    if output::is_json() {
        return output::print(&out);
    }

    if let Some(reason) = out.skipped {
        output::eprintln_line(&format!("{op}: nothing to do ({})", skip_hint(reason)));
    }
    if let Some(err) = &out.error {
        output::eprintln_line(&format!("{op} failed: {err}"));
    }
    output::render(out.phase, &out.state)
}

/// Print the outcome, then turn an operation error into a process error.
pub fn finish(ctl: &Controller, op: &'static str, result: TallyResult<Outcome>) -> Result<()> {
    report(ctl, op, &result)?;
    result?;
    Ok(())
}

fn skip_hint(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Busy => "another operation is in flight",
        SkipReason::NotConnected => "no wallet connected",
        SkipReason::NotUninitialized => "counter is not in the uninitialized state",
        SkipReason::NotReady => "counter is not initialized",
        SkipReason::AtZero => "counter is already 0",
    }
}
