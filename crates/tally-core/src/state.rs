//! Local mirror of the on-chain counter.
//!
//! The store is a plain value with an enumerated transition set. It does no
//! I/O and never guesses a value: `SetValue` is only applied with a count that
//! was just read back from the ledger.

use serde::Serialize;

/// What the presentation layer renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocalCounterState {
    /// Last observed on-chain value, `None` until a successful fetch.
    pub count: Option<u64>,
    pub initialized: bool,
    pub busy: bool,
}

/// Where the mirror stands relative to the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Observation {
    /// Nothing fetched yet for the current signer.
    #[default]
    Unknown,
    /// Fetched; the account is absent or unreadable.
    Uninitialized,
    /// Fetched; value known.
    Ready(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    MarkBusy,
    ClearBusy,
    SetUninitialized,
    SetValue(u64),
    /// Forget the observation (signer changed). `busy` is left alone.
    Reset,
}

#[derive(Debug, Default)]
pub struct CounterStateStore {
    observation: Observation,
    busy: bool,
}

impl CounterStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> LocalCounterState {
        match self.observation {
            Observation::Unknown | Observation::Uninitialized => LocalCounterState {
                count: None,
                initialized: false,
                busy: self.busy,
            },
            Observation::Ready(n) => LocalCounterState {
                count: Some(n),
                initialized: true,
                busy: self.busy,
            },
        }
    }

    pub fn observation(&self) -> Observation {
        self.observation
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::MarkBusy => self.busy = true,
            Transition::ClearBusy => self.busy = false,
            Transition::SetUninitialized => self.observation = Observation::Uninitialized,
            Transition::SetValue(n) => self.observation = Observation::Ready(n),
            Transition::Reset => self.observation = Observation::Unknown,
        }
        tracing::debug!(?transition, state = ?self.read(), "counter state transition");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_and_idle() {
        let store = CounterStateStore::new();
        assert_eq!(
            store.read(),
            LocalCounterState {
                count: None,
                initialized: false,
                busy: false
            }
        );
        assert_eq!(store.observation(), Observation::Unknown);
    }

    #[test]
    fn set_value_marks_initialized() {
        let mut store = CounterStateStore::new();
        store.apply(Transition::SetValue(7));
        assert_eq!(store.read().count, Some(7));
        assert!(store.read().initialized);

        store.apply(Transition::SetUninitialized);
        assert_eq!(store.read().count, None);
        assert!(!store.read().initialized);
        assert_eq!(store.observation(), Observation::Uninitialized);
    }

    #[test]
    fn busy_is_orthogonal_to_observation() {
        let mut store = CounterStateStore::new();
        store.apply(Transition::MarkBusy);
        store.apply(Transition::SetValue(3));
        store.apply(Transition::Reset);
        assert!(store.is_busy());
        assert_eq!(store.observation(), Observation::Unknown);

        store.apply(Transition::ClearBusy);
        assert!(!store.read().busy);
    }
}
