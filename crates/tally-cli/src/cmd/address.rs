use anyhow::Result;
use serde::Serialize;

use tally_core::pda;

use crate::args::Cli;
use crate::output;

#[derive(Debug, Serialize)]
pub struct AddressOut {
    pub program_id: String,
    pub seed: String,
    pub address: String,
    pub bump: u8,
}

pub fn run(cli: &Cli) -> Result<()> {
    let cfg = cli.session_config()?;
    let program_id = cfg.program_id()?;
    let derived = pda::derive(cfg.seed_bytes(), &program_id)?;

    let out = AddressOut {
        program_id: program_id.to_string(),
        seed: cfg.seed.clone(),
        address: derived.address.to_string(),
        bump: derived.bump,
    };
    if output::is_json() {
        return output::print(&out);
    }
    println!("program: {}", out.program_id);
    println!("seed:    {}", out.seed);
    println!("counter: {} (bump {})", out.address, out.bump);
    Ok(())
}
