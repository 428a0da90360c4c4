//! Error taxonomy for tally.
//!
//! Two layers:
//! - `ChainError` is what a single remote round-trip can fail with.
//! - `CounterError` is what a controller operation reports outward. It keeps
//!   the `ChainError` it was caused by together with the step that failed, so
//!   callers can tell a failed `initialize` from a failed `delegate`.
//!
//! Recovery differs by kind, so nothing here collapses causes into a single
//! generic failure. Use `CounterError::kind()` to branch.

use std::fmt;

use thiserror::Error;

pub type TallyResult<T> = Result<T, CounterError>;

/// Failure of one remote call (submit or fetch).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The signer declined, or the transaction could not be assembled for signing.
    #[error("submission rejected: {0}")]
    Submission(String),

    /// RPC unreachable, timed out, or returned a transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The on-chain program rejected the instruction.
    #[error("program error{}: {message}", code_suffix(.code))]
    Program { code: Option<u32>, message: String },

    /// Account bytes do not match the known account schema.
    #[error("decode error: {0}")]
    Decode(String),
}

fn code_suffix(code: &Option<u32>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

impl ChainError {
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn program(code: Option<u32>, msg: impl Into<String>) -> Self {
        Self::Program {
            code,
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Submission(_) => ErrorKind::Submission,
            Self::Network(_) => ErrorKind::Network,
            Self::Program { .. } => ErrorKind::Program,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// The remote step a `CounterError::Chain` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sync,
    Initialize,
    Increment,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Initialize => "initialize",
            Self::Increment => "increment",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification used by callers to pick a recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DerivationExhausted,
    Network,
    Submission,
    Program,
    Decode,
    PartialDecrement,
    InvalidConfig,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DerivationExhausted => "derivation_exhausted",
            Self::Network => "network",
            Self::Submission => "submission",
            Self::Program => "program",
            Self::Decode => "decode",
            Self::PartialDecrement => "partial_decrement",
            Self::InvalidConfig => "invalid_config",
        }
    }
}

/// Error reported by a controller operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    /// No bump seed produced an off-curve address.
    #[error("program address derivation exhausted for seed {seed:?}")]
    DerivationExhausted { seed: String },

    /// A remote step failed.
    #[error("{op} failed: {source}")]
    Chain {
        op: Step,
        #[source]
        source: ChainError,
    },

    /// `delegate` failed after `initialize` had already succeeded.
    ///
    /// The account exists on-chain; it is only the hand-off that is missing.
    #[error("delegate failed after initialize succeeded: {source}")]
    Delegation {
        #[source]
        source: ChainError,
    },

    /// The increment loop backing a decrement stopped early.
    ///
    /// `completed` increments landed on-chain and are not rolled back.
    #[error("decrement stopped after {completed} of {required} increments: {source}")]
    PartialDecrementFailure {
        completed: u64,
        required: u64,
        #[source]
        source: ChainError,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl CounterError {
    pub fn chain(op: Step, source: ChainError) -> Self {
        Self::Chain { op, source }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DerivationExhausted { .. } => ErrorKind::DerivationExhausted,
            Self::Chain { source, .. } | Self::Delegation { source } => source.kind(),
            Self::PartialDecrementFailure { .. } => ErrorKind::PartialDecrement,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// The underlying remote failure, if any.
    pub fn chain_error(&self) -> Option<&ChainError> {
        match self {
            Self::Chain { source, .. }
            | Self::Delegation { source }
            | Self::PartialDecrementFailure { source, .. } => Some(source),
            _ => None,
        }
    }

    /// True when re-issuing the same user action may succeed without any other change.
    pub fn is_transient(&self) -> bool {
        matches!(self.chain_error(), Some(ChainError::Network(_)))
    }
}
