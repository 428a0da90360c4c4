use anyhow::Result;

use tally_solana_client::INSTRUCTIONS;

use crate::output;

pub fn run() -> Result<()> {
    output::print(&INSTRUCTIONS)
}
