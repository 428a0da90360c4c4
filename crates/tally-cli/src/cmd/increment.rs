use anyhow::Result;

use crate::args::Cli;
use crate::cmd;

pub async fn run(cli: &Cli) -> Result<()> {
    let ctl = cmd::connect_for(cli, "increment").await?;
    let result = ctl.increment_counter().await;
    cmd::finish(&ctl, "increment", result)
}
