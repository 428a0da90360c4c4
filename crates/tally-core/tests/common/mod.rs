//! In-memory stand-in for the counter program.
//!
//! Mirrors the deployed program's observable behavior:
//! - `initialize` creates the account at 0 and fails if it already exists
//! - `delegate` requires the account to exist
//! - `increment` adds 1 and wraps to 0 once the value would exceed 1000
//!
//! Failures can be injected per instruction and per zero-based call index,
//! and submits or fetches can be held in flight to exercise the busy guard and
//! signer changes mid-sync.

#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use tokio::sync::{Notify, Semaphore};

use tally_core::prelude::*;

const PROGRAM_WRAP: u64 = 1000;

#[derive(Default)]
struct LedgerState {
    count: Option<u64>,
    delegated: bool,
    corrupt: bool,
    submitted: Vec<String>,
    attempts: HashMap<String, usize>,
    failures: Vec<(String, usize, ChainError)>,
    fetch_failures: VecDeque<ChainError>,
    fetches: usize,
    last_user: Option<Pubkey>,
}

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    entered: Notify,
    fetch_gate: Mutex<Option<Arc<Semaphore>>>,
    fetch_entered: Notify,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_count(count: u64) -> Arc<Self> {
        let ledger = Self::new();
        ledger.state.lock().count = Some(count);
        ledger
    }

    pub fn count(&self) -> Option<u64> {
        self.state.lock().count
    }

    pub fn set_count(&self, count: u64) {
        self.state.lock().count = Some(count);
    }

    pub fn is_delegated(&self) -> bool {
        self.state.lock().delegated
    }

    pub fn corrupt_account(&self) {
        self.state.lock().corrupt = true;
    }

    pub fn last_user(&self) -> Option<Pubkey> {
        self.state.lock().last_user
    }

    /// Every submit attempt, successful or not, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.state.lock().submitted.clone()
    }

    pub fn submitted_count(&self, name: &str) -> usize {
        self.state.lock().submitted.iter().filter(|n| *n == name).count()
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().fetches
    }

    /// Fail the `index`-th (zero-based) submit of `name`.
    pub fn fail_submit(&self, name: &str, index: usize, error: ChainError) {
        self.state.lock().failures.push((name.to_string(), index, error));
    }

    pub fn fail_next_fetch(&self, error: ChainError) {
        self.state.lock().fetch_failures.push_back(error);
    }

    /// Hold every following submit until `resume` is called.
    pub fn pause(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn resume(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.close();
        }
    }

    /// Resolves once a submit is parked on the gate.
    pub async fn wait_for_parked_submit(&self) {
        self.entered.notified().await;
    }

    /// Hold every following fetch until `resume_fetches` is called.
    pub fn pause_fetches(&self) {
        *self.fetch_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn resume_fetches(&self) {
        if let Some(gate) = self.fetch_gate.lock().take() {
            gate.close();
        }
    }

    pub async fn wait_for_parked_fetch(&self) {
        self.fetch_entered.notified().await;
    }

    fn apply(&self, call: &InstructionCall) -> Result<(), ChainError> {
        let mut st = self.state.lock();
        st.submitted.push(call.name.clone());

        let index = {
            let n = st.attempts.entry(call.name.clone()).or_insert(0);
            let i = *n;
            *n += 1;
            i
        };
        if let Some(pos) = st
            .failures
            .iter()
            .position(|(name, i, _)| *name == call.name && *i == index)
        {
            let (_, _, err) = st.failures.remove(pos);
            return Err(err);
        }

        match call.name.as_str() {
            ix::INITIALIZE => {
                for r in [role::COUNTER, role::USER, role::SYSTEM_PROGRAM] {
                    if call.role_address(r).is_none() {
                        return Err(ChainError::submission(format!("missing role {r}")));
                    }
                }
                if st.count.is_some() {
                    return Err(ChainError::program(Some(0), "account already in use"));
                }
                st.last_user = call.role_address(role::USER).copied();
                st.count = Some(0);
                Ok(())
            }
            ix::DELEGATE => {
                if st.count.is_none() {
                    return Err(ChainError::program(Some(3012), "account not initialized"));
                }
                st.delegated = true;
                Ok(())
            }
            ix::INCREMENT => {
                let Some(c) = st.count else {
                    return Err(ChainError::program(Some(3012), "account not initialized"));
                };
                let next = c + 1;
                st.count = Some(if next > PROGRAM_WRAP { 0 } else { next });
                Ok(())
            }
            other => Err(ChainError::program(None, format!("unknown instruction {other}"))),
        }
    }
}

#[async_trait]
impl ChainClient for MockLedger {
    async fn submit(
        &self,
        call: &InstructionCall,
        _signer: &WalletSigner,
    ) -> Result<TransactionResult, ChainError> {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            self.entered.notify_one();
            let _ = gate.acquire().await;
        }
        self.apply(call)?;
        Ok(TransactionResult {
            signature: Signature::default(),
        })
    }

    async fn fetch_account(&self, _address: &Pubkey) -> Result<Option<CounterAccount>, ChainError> {
        let gate = self.fetch_gate.lock().clone();
        if let Some(gate) = gate {
            self.fetch_entered.notify_one();
            let _ = gate.acquire().await;
        }
        let mut st = self.state.lock();
        st.fetches += 1;
        if let Some(err) = st.fetch_failures.pop_front() {
            return Err(err);
        }
        if st.corrupt {
            return Err(ChainError::decode("account discriminator mismatch"));
        }
        Ok(st.count.map(|count| CounterAccount { count }))
    }
}

pub fn signer() -> Arc<WalletSigner> {
    Arc::new(Keypair::new())
}

pub fn controller(ledger: &Arc<MockLedger>) -> CounterController<MockLedger> {
    CounterController::new(ledger.clone(), &SessionConfig::default()).unwrap()
}

/// A controller with a signer attached and the ledger already read.
pub async fn connected(ledger: &Arc<MockLedger>) -> CounterController<MockLedger> {
    let ctl = controller(ledger);
    ctl.set_signer(Some(signer())).await.unwrap();
    ctl
}
