//! Configuration structures for tally.
//!
//! `SessionConfig` is an explicit, serializable object built by the caller
//! (CLI flags, a config file, an embedding UI). The core crate does not read
//! environment variables.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::errors::{CounterError, TallyResult};

/// Program id of the deployed counter program.
pub const DEFAULT_PROGRAM_ID: &str = "JDf5TTQD3ViLN4zuBKk351xBJTBpxkhUeHgSHo1ENwMV";

/// Seed of the single global counter account.
pub const DEFAULT_SEED: &str = "test-pda";

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";

/// Per-seed length limit enforced by the ledger's address derivation.
pub const MAX_SEED_LEN: usize = 32;

/// Everything needed to talk to one counter deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub rpc_url: String,
    pub program_id: String,
    pub seed: String,
    #[serde(default)]
    pub commitment: Commitment,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            seed: DEFAULT_SEED.to_string(),
            commitment: Commitment::default(),
        }
    }
}

impl SessionConfig {
    pub fn program_id(&self) -> TallyResult<Pubkey> {
        self.program_id
            .parse()
            .map_err(|_| CounterError::invalid_config(format!("invalid program id: {}", self.program_id)))
    }

    pub fn seed_bytes(&self) -> &[u8] {
        self.seed.as_bytes()
    }
}

/// Confirmation strength requested from the ledger for submits and fetches.
///
/// `Processed` is the least strict level and the default: fastest feedback,
/// no finality guarantee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    #[default]
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn parse(s: &str) -> TallyResult<Self> {
        match s {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            _ => Err(CounterError::invalid_config(format!(
                "unsupported commitment level: {s}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &SessionConfig) -> TallyResult<()> {
    if cfg.rpc_url.trim().is_empty() {
        return Err(CounterError::invalid_config("rpc_url must not be empty"));
    }

    if cfg.seed.is_empty() {
        return Err(CounterError::invalid_config("seed must not be empty"));
    }

    if cfg.seed.len() > MAX_SEED_LEN {
        return Err(CounterError::invalid_config(format!(
            "seed must be at most {MAX_SEED_LEN} bytes"
        )));
    }

    cfg.program_id()?;
    Ok(())
}
