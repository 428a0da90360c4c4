use anyhow::Result;

use crate::args::Cli;
use crate::cmd;

pub async fn run(cli: &Cli) -> Result<()> {
    let ctl = cmd::connect_for(cli, "init").await?;
    let result = ctl.initialize_counter().await;
    cmd::finish(&ctl, "init", result)
}
