//! The seam between the controller and the remote ledger.
//!
//! `ChainClient` is deliberately thin: build + sign + submit + confirm one named
//! instruction, or fetch and decode the counter account. It never retries.
//! Implementations live outside this crate (see `tally-solana-client`).

use std::collections::BTreeMap;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Signature, Signer};

use crate::errors::ChainError;

/// A borrowed wallet capability. Only `pubkey()` and signing are used.
pub type WalletSigner = dyn Signer + Send + Sync;

/// Instruction names of the counter program interface.
pub mod ix {
    pub const INITIALIZE: &str = "initialize";
    pub const DELEGATE: &str = "delegate";
    pub const INCREMENT: &str = "increment";
}

/// Account role names of the counter program interface.
pub mod role {
    pub const COUNTER: &str = "counter";
    pub const USER: &str = "user";
    pub const SYSTEM_PROGRAM: &str = "systemProgram";
    pub const PAYER: &str = "payer";
    pub const PDA: &str = "pda";
}

/// A named instruction plus the accounts the caller supplies for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionCall {
    pub name: String,
    pub roles: BTreeMap<String, Pubkey>,
    pub args: Option<Vec<u8>>,
}

impl InstructionCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: BTreeMap::new(),
            args: None,
        }
    }

    pub fn role(mut self, name: impl Into<String>, address: Pubkey) -> Self {
        self.roles.insert(name.into(), address);
        self
    }

    pub fn args(mut self, payload: Vec<u8>) -> Self {
        self.args = Some(payload);
        self
    }

    pub fn role_address(&self, name: &str) -> Option<&Pubkey> {
        self.roles.get(name)
    }
}

/// Result of a confirmed submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionResult {
    pub signature: Signature,
}

/// Decoded counter account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAccount {
    pub count: u64,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Build, sign, submit and wait for confirmation of one instruction.
    async fn submit(
        &self,
        call: &InstructionCall,
        signer: &WalletSigner,
    ) -> Result<TransactionResult, ChainError>;

    /// Fetch and decode the counter account. `Ok(None)` means the account does not exist.
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<CounterAccount>, ChainError>;
}
