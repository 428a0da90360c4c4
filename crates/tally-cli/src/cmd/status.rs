use anyhow::Result;
use serde::Serialize;

use tally_core::controller::Phase;
use tally_core::state::LocalCounterState;

use crate::args::Cli;
use crate::output;
use crate::solana::client;

#[derive(Debug, Serialize)]
pub struct StatusOut {
    pub address: String,
    pub phase: Phase,
    pub state: LocalCounterState,
}

pub async fn run(cli: &Cli) -> Result<()> {
    let ctl = client::controller(cli)?;
    let address = ctl.counter_address()?;
    ctl.set_signer(client::wallet(cli)?).await?;

    if output::is_json() {
        return output::print(&StatusOut {
            address: address.to_string(),
            phase: ctl.phase(),
            state: ctl.state(),
        });
    }

    println!("counter: {address}");
    output::render(ctl.phase(), &ctl.state())
}
