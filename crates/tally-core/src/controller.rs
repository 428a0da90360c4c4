//! CounterController: sequences remote calls and reconciles the local mirror.
//!
//! Concurrency model:
//! - Guarded operations (`initialize_counter`, `increment_counter`,
//!   `decrement_counter`) check and set `busy` atomically before their first
//!   await point. A guarded call that finds `busy` set is dropped, not queued.
//! - `busy` is cleared by a drop guard, so every exit path releases it.
//! - `sync` ignores `busy` but is serialized against itself.
//! - Values only ever come from `sync`. Writes are never predicted locally.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use solana_sdk::system_program;

use crate::chain::{ix, role, ChainClient, InstructionCall, TransactionResult, WalletSigner};
use crate::config::{validate_config, SessionConfig};
use crate::errors::{ChainError, CounterError, Step, TallyResult};
use crate::pda::{self, DerivedAddress};
use crate::state::{CounterStateStore, LocalCounterState, Observation, Transition};

/// Largest value the counter program stores before wrapping back to 0.
///
/// This mirrors a constant of the deployed program; it is not queried from the
/// ledger. If the program changes its ceiling, decrement lands on the wrong value.
pub const WRAP_CEILING: u64 = 1000;

/// Number of increments issued to emulate one decrement from `current`.
///
/// The program has no decrement instruction. The emulation increments until
/// the program's own wraparound rule carries the value past `WRAP_CEILING`.
pub fn decrement_increments(current: u64) -> u64 {
    WRAP_CEILING.saturating_sub(current) + 1
}

/// Controller state as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "count", rename_all = "snake_case")]
pub enum Phase {
    /// No signer available.
    Unconnected,
    /// Signer present, ledger not read yet.
    Unknown,
    Uninitialized,
    Ready(u64),
}

/// Why a guarded operation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Busy,
    NotConnected,
    NotUninitialized,
    NotReady,
    AtZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied(LocalCounterState),
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Progress of the increment loop behind a decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecrementProgress {
    pub completed: u64,
    pub required: u64,
}

/// Clears `busy` when dropped.
struct BusyGuard<'a> {
    store: &'a Mutex<CounterStateStore>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.store.lock().apply(Transition::ClearBusy);
    }
}

pub struct CounterController<C> {
    chain: Arc<C>,
    program_id: Pubkey,
    seed: Vec<u8>,
    address: OnceLock<DerivedAddress>,
    store: Mutex<CounterStateStore>,
    signer: RwLock<Option<Arc<WalletSigner>>>,
    // Bumped on every signer change; a sync that started under an older
    // epoch does not write its result.
    epoch: AtomicU64,
    sync_lock: tokio::sync::Mutex<()>,
}

impl<C: ChainClient> CounterController<C> {
    /// Create a controller in the `Unconnected` state.
    pub fn new(chain: Arc<C>, config: &SessionConfig) -> TallyResult<Self> {
        validate_config(config)?;
        Ok(Self {
            chain,
            program_id: config.program_id()?,
            seed: config.seed_bytes().to_vec(),
            address: OnceLock::new(),
            store: Mutex::new(CounterStateStore::new()),
            signer: RwLock::new(None),
            epoch: AtomicU64::new(0),
            sync_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Snapshot of the local mirror.
    pub fn state(&self) -> LocalCounterState {
        self.store.lock().read()
    }

    pub fn phase(&self) -> Phase {
        if !self.is_connected() {
            return Phase::Unconnected;
        }
        match self.store.lock().observation() {
            Observation::Unknown => Phase::Unknown,
            Observation::Uninitialized => Phase::Uninitialized,
            Observation::Ready(n) => Phase::Ready(n),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.signer.read().is_some()
    }

    /// The counter PDA, derived once and memoized.
    pub fn counter_address(&self) -> TallyResult<Pubkey> {
        if let Some(d) = self.address.get() {
            return Ok(d.address);
        }
        let derived = pda::derive(&self.seed, &self.program_id)?;
        Ok(self.address.get_or_init(|| derived).address)
    }

    /// Swap the wallet capability and re-read the ledger if one is present.
    #[tracing::instrument(skip_all, fields(connected = signer.is_some()))]
    pub async fn set_signer(&self, signer: Option<Arc<WalletSigner>>) -> TallyResult<Phase> {
        let connected = signer.is_some();
        *self.signer.write() = signer;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.store.lock().apply(Transition::Reset);

        if connected {
            self.sync().await?;
        }
        Ok(self.phase())
    }

    /// Read the counter account and mirror it locally.
    ///
    /// Absent or undecodable accounts move the mirror to uninitialized. A
    /// network failure leaves it untouched. Does nothing while unconnected.
    #[tracing::instrument(skip_all)]
    pub async fn sync(&self) -> TallyResult<LocalCounterState> {
        let _serial = self.sync_lock.lock().await;

        if !self.is_connected() {
            tracing::debug!("no signer; skipping sync");
            return Ok(self.state());
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let address = self.counter_address()?;
        let fetched = self.chain.fetch_account(&address).await;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("signer changed during fetch; discarding result");
            return Ok(self.state());
        }

        match fetched {
            Ok(Some(account)) => {
                tracing::debug!(%address, count = account.count, "counter fetched");
                self.store.lock().apply(Transition::SetValue(account.count));
                Ok(self.state())
            }
            Ok(None) => {
                tracing::debug!(%address, "counter account not found");
                self.store.lock().apply(Transition::SetUninitialized);
                Ok(self.state())
            }
            Err(e @ ChainError::Decode(_)) => {
                tracing::error!(%address, error = %e, "counter account does not match the known schema");
                self.store.lock().apply(Transition::SetUninitialized);
                Err(CounterError::chain(Step::Sync, e))
            }
            Err(e) => {
                tracing::warn!(%address, error = %e, "sync failed; keeping previous state");
                Err(CounterError::chain(Step::Sync, e))
            }
        }
    }

    /// Create the counter account, then delegate it.
    ///
    /// A failed `delegate` does not undo `initialize`: the mirror is re-synced
    /// and the failure is reported as `CounterError::Delegation`.
    #[tracing::instrument(skip_all)]
    pub async fn initialize_counter(&self) -> TallyResult<Outcome> {
        let (guard, ()) = match self.begin(|obs| match obs {
            Observation::Uninitialized => Ok(()),
            _ => Err(SkipReason::NotUninitialized),
        }) {
            Ok(started) => started,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let address = self.counter_address()?;
        let user = self
            .signer_pubkey()
            .map_err(|e| CounterError::chain(Step::Initialize, e))?;

        let init = InstructionCall::new(ix::INITIALIZE)
            .role(role::COUNTER, address)
            .role(role::USER, user)
            .role(role::SYSTEM_PROGRAM, system_program::id());
        self.submit(&init)
            .await
            .map_err(|e| CounterError::chain(Step::Initialize, e))?;

        let delegate = InstructionCall::new(ix::DELEGATE)
            .role(role::PAYER, user)
            .role(role::PDA, address);
        if let Err(source) = self.submit(&delegate).await {
            tracing::warn!(error = %source, "delegate failed after initialize succeeded");
            if let Err(e) = self.sync().await {
                tracing::warn!(error = %e, "sync after failed delegate also failed");
            }
            drop(guard);
            return Err(CounterError::Delegation { source });
        }

        self.sync().await?;
        drop(guard);
        Ok(Outcome::Applied(self.state()))
    }

    /// Increment once and re-read.
    ///
    /// Any value in `0..=WRAP_CEILING` is valid afterwards; the program wraps
    /// past the ceiling back to 0.
    #[tracing::instrument(skip_all)]
    pub async fn increment_counter(&self) -> TallyResult<Outcome> {
        let (guard, _) = match self.begin(Self::require_ready) {
            Ok(started) => started,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let call = self.increment_call()?;
        self.submit(&call)
            .await
            .map_err(|e| CounterError::chain(Step::Increment, e))?;

        self.sync().await?;
        drop(guard);
        Ok(Outcome::Applied(self.state()))
    }

    /// Emulate a decrement by incrementing through the wraparound.
    pub async fn decrement_counter(&self) -> TallyResult<Outcome> {
        self.decrement_counter_with(|_| {}).await
    }

    /// Like `decrement_counter`, reporting progress after every increment.
    ///
    /// Issues `decrement_increments(current)` sequential submits. Not atomic:
    /// on failure the increments that landed stay, the mirror is re-synced and
    /// `CounterError::PartialDecrementFailure` reports how many completed.
    #[tracing::instrument(skip_all)]
    pub async fn decrement_counter_with<F>(&self, mut on_progress: F) -> TallyResult<Outcome>
    where
        F: FnMut(DecrementProgress) + Send,
    {
        let (guard, current) = match self.begin(|obs| match Self::require_ready(obs)? {
            0 => Err(SkipReason::AtZero),
            n => Ok(n),
        }) {
            Ok(started) => started,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let required = decrement_increments(current);
        let call = self.increment_call()?;
        tracing::info!(current, required, "emulating decrement through wraparound");

        for completed in 0..required {
            if let Err(source) = self.submit(&call).await {
                tracing::warn!(completed, required, error = %source, "decrement interrupted");
                if let Err(e) = self.sync().await {
                    tracing::warn!(error = %e, "sync after interrupted decrement failed");
                }
                drop(guard);
                return Err(CounterError::PartialDecrementFailure {
                    completed,
                    required,
                    source,
                });
            }
            let progress = DecrementProgress {
                completed: completed + 1,
                required,
            };
            tracing::debug!(completed = progress.completed, required, "decrement step");
            on_progress(progress);
        }

        self.sync().await?;
        drop(guard);
        Ok(Outcome::Applied(self.state()))
    }

    fn require_ready(obs: Observation) -> Result<u64, SkipReason> {
        match obs {
            Observation::Ready(n) => Ok(n),
            _ => Err(SkipReason::NotReady),
        }
    }

    fn increment_call(&self) -> TallyResult<InstructionCall> {
        Ok(InstructionCall::new(ix::INCREMENT).role(role::COUNTER, self.counter_address()?))
    }

    /// Check preconditions and set `busy` under one lock.
    fn begin<T>(
        &self,
        precondition: impl FnOnce(Observation) -> Result<T, SkipReason>,
    ) -> Result<(BusyGuard<'_>, T), SkipReason> {
        if !self.is_connected() {
            return Err(SkipReason::NotConnected);
        }

        let mut store = self.store.lock();
        if store.is_busy() {
            tracing::debug!("operation in flight; dropping request");
            return Err(SkipReason::Busy);
        }
        let value = precondition(store.observation())?;
        store.apply(Transition::MarkBusy);
        drop(store);

        Ok((BusyGuard { store: &self.store }, value))
    }

    fn current_signer(&self) -> Result<Arc<WalletSigner>, ChainError> {
        self.signer
            .read()
            .clone()
            .ok_or_else(|| ChainError::submission("no signer connected"))
    }

    fn signer_pubkey(&self) -> Result<Pubkey, ChainError> {
        Ok(self.current_signer()?.pubkey())
    }

    /// The signer is held only for the duration of this one call.
    async fn submit(&self, call: &InstructionCall) -> Result<TransactionResult, ChainError> {
        let signer = self.current_signer()?;
        let result = self.chain.submit(call, signer.as_ref()).await?;
        tracing::info!(instruction = %call.name, signature = %result.signature, "instruction confirmed");
        Ok(result)
    }
}
