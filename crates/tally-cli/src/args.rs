use clap::{Parser, Subcommand};

use tally_core::config::{
    validate_config, Commitment, SessionConfig, DEFAULT_PROGRAM_ID, DEFAULT_RPC_URL, DEFAULT_SEED,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "tally", version, about = "Keep a local view in sync with the on-chain counter")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// RPC endpoint of the cluster.
    #[arg(long, global = true, default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Counter program id.
    #[arg(long, global = true, default_value = DEFAULT_PROGRAM_ID)]
    pub program_id: String,

    /// Seed of the global counter account.
    #[arg(long, global = true, default_value = DEFAULT_SEED)]
    pub seed: String,

    /// Commitment level: processed|confirmed|finalized
    #[arg(long, global = true, default_value = "processed")]
    pub commitment: String,

    /// Wallet keypair file. Without it the session stays disconnected.
    #[arg(long, global = true)]
    pub keypair: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Read the counter and print the local view.
    Status,

    /// Create the counter account and delegate it.
    Init,

    /// Increment the counter once.
    Increment,

    /// Emulate a decrement by incrementing through the wraparound (slow: up to 1000 transactions).
    Decrement,

    /// Interactive session: keeps one controller alive and reads commands from stdin.
    Session,

    /// Print the derived counter address.
    Address,

    /// Print the program interface this client builds instructions from.
    Schema,
}

impl Cli {
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let cfg = SessionConfig {
            rpc_url: self.rpc_url.clone(),
            program_id: self.program_id.clone(),
            seed: self.seed.clone(),
            commitment: Commitment::parse(&self.commitment)?,
        };
        validate_config(&cfg)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_program() {
        let cli = Cli::try_parse_from(["tally", "status"]).unwrap();
        let cfg = cli.session_config().unwrap();
        assert_eq!(cfg, SessionConfig::default());
        assert!(cli.keypair.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tally",
            "increment",
            "--commitment",
            "confirmed",
            "--keypair",
            "id.json",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.keypair.as_deref(), Some("id.json"));
        assert_eq!(cli.session_config().unwrap().commitment, Commitment::Confirmed);
    }

    #[test]
    fn bad_commitment_is_rejected() {
        let cli = Cli::try_parse_from(["tally", "status", "--commitment", "max"]).unwrap();
        assert!(cli.session_config().is_err());
    }
}
