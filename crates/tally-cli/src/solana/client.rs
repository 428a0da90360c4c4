use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use solana_sdk::signature::read_keypair_file;

use tally_core::chain::WalletSigner;
use tally_core::controller::{CounterController, Phase};
use tally_core::TallyResult;
use tally_solana_client::RpcChainClient;

use crate::args::Cli;

pub type Controller = CounterController<RpcChainClient>;

/// Build a controller from CLI flags. The session starts unconnected.
pub fn controller(cli: &Cli) -> Result<Controller> {
    let cfg = cli.session_config()?;
    let chain = Arc::new(RpcChainClient::new(&cfg)?);
    tracing::debug!(rpc = %chain.url(), commitment = cfg.commitment.as_str(), "rpc client ready");
    Ok(CounterController::new(chain, &cfg)?)
}

/// Load the wallet named by `--keypair`, if any.
pub fn wallet(cli: &Cli) -> Result<Option<Arc<WalletSigner>>> {
    let Some(path) = cli.keypair.as_deref() else {
        return Ok(None);
    };
    let keypair = read_keypair_file(path)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("failed to read keypair {path}"))?;
    let signer: Arc<WalletSigner> = Arc::new(keypair);
    Ok(Some(signer))
}

/// Controller with the wallet attached and the ledger read once.
///
/// The result of that first read comes back next to the controller; callers
/// decide whether a failed read ends the command or only gets reported.
pub async fn connect(cli: &Cli) -> Result<(Controller, TallyResult<Phase>)> {
    let ctl = controller(cli)?;
    let synced = ctl.set_signer(wallet(cli)?).await;
    Ok((ctl, synced))
}
