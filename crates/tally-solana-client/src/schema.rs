//! Static interface of the counter program.
//!
//! Instruction data is an 8-byte discriminator, `sha256("global:<name>")[..8]`,
//! followed by the optional argument payload. The counter account is an 8-byte
//! discriminator, `sha256("account:Counter")[..8]`, followed by `count` as a
//! little-endian u64.
//!
//! Each instruction lists its accounts in program order. Caller roles fill
//! `Role` slots; program ids and auxiliary PDAs are resolved here.

use serde::Serialize;
use sha2::{Digest, Sha256};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use tally_core::chain::{ix, role, CounterAccount, InstructionCall};
use tally_core::pda;
use tally_core::ChainError;

use crate::constants::{
    delegation_program_id, COUNTER_ACCOUNT, COUNTER_ACCOUNT_LEN, DISCRIMINATOR_LEN, SEED_BUFFER,
    SEED_DELEGATION, SEED_DELEGATION_METADATA,
};

pub type Discriminator = [u8; DISCRIMINATOR_LEN];

fn discriminator(namespace: &str, name: &str) -> Discriminator {
    let mut h = Sha256::new();
    h.update(namespace.as_bytes());
    h.update(b":");
    h.update(name.as_bytes());
    let digest = h.finalize();
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

pub fn instruction_discriminator(name: &str) -> Discriminator {
    discriminator("global", name)
}

pub fn account_discriminator(name: &str) -> Discriminator {
    discriminator("account", name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramRef {
    /// The counter program itself.
    Owner,
    Delegation,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountSource {
    /// Supplied by the caller under this role name.
    Role { role: &'static str },
    /// A program id. A caller role with the slot's name overrides it.
    Program { program: ProgramRef },
    /// PDA keyed by another slot's role address.
    Pda {
        seed: &'static str,
        of_role: &'static str,
        program: ProgramRef,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountSlot {
    pub name: &'static str,
    pub writable: bool,
    pub signer: bool,
    pub source: AccountSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstructionSchema {
    pub name: &'static str,
    pub accounts: &'static [AccountSlot],
}

const fn slot(name: &'static str, writable: bool, signer: bool, source: AccountSource) -> AccountSlot {
    AccountSlot {
        name,
        writable,
        signer,
        source,
    }
}

const INITIALIZE_ACCOUNTS: &[AccountSlot] = &[
    slot(role::COUNTER, true, false, AccountSource::Role { role: role::COUNTER }),
    slot(role::USER, true, true, AccountSource::Role { role: role::USER }),
    slot(role::SYSTEM_PROGRAM, false, false, AccountSource::Program { program: ProgramRef::System }),
];

const DELEGATE_ACCOUNTS: &[AccountSlot] = &[
    slot(role::PAYER, true, true, AccountSource::Role { role: role::PAYER }),
    slot(
        "bufferPda",
        true,
        false,
        AccountSource::Pda { seed: SEED_BUFFER, of_role: role::PDA, program: ProgramRef::Owner },
    ),
    slot(
        "delegationRecordPda",
        true,
        false,
        AccountSource::Pda { seed: SEED_DELEGATION, of_role: role::PDA, program: ProgramRef::Delegation },
    ),
    slot(
        "delegationMetadataPda",
        true,
        false,
        AccountSource::Pda {
            seed: SEED_DELEGATION_METADATA,
            of_role: role::PDA,
            program: ProgramRef::Delegation,
        },
    ),
    slot(role::PDA, true, false, AccountSource::Role { role: role::PDA }),
    slot("ownerProgram", false, false, AccountSource::Program { program: ProgramRef::Owner }),
    slot("delegationProgram", false, false, AccountSource::Program { program: ProgramRef::Delegation }),
    slot(role::SYSTEM_PROGRAM, false, false, AccountSource::Program { program: ProgramRef::System }),
];

const INCREMENT_ACCOUNTS: &[AccountSlot] = &[slot(
    role::COUNTER,
    true,
    false,
    AccountSource::Role { role: role::COUNTER },
)];

/// All instructions this client knows how to build.
pub const INSTRUCTIONS: &[InstructionSchema] = &[
    InstructionSchema { name: ix::INITIALIZE, accounts: INITIALIZE_ACCOUNTS },
    InstructionSchema { name: ix::DELEGATE, accounts: DELEGATE_ACCOUNTS },
    InstructionSchema { name: ix::INCREMENT, accounts: INCREMENT_ACCOUNTS },
];

pub fn lookup(name: &str) -> Option<&'static InstructionSchema> {
    INSTRUCTIONS.iter().find(|s| s.name == name)
}

/// The counter program's interface bound to concrete program ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramInterface {
    pub program_id: Pubkey,
    pub delegation_program_id: Pubkey,
}

impl ProgramInterface {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            delegation_program_id: delegation_program_id(),
        }
    }

    fn program(&self, p: ProgramRef) -> Pubkey {
        match p {
            ProgramRef::Owner => self.program_id,
            ProgramRef::Delegation => self.delegation_program_id,
            ProgramRef::System => system_program::id(),
        }
    }

    fn resolve(&self, slot: &AccountSlot, call: &InstructionCall) -> Result<Pubkey, ChainError> {
        let required = |role: &str| {
            call.role_address(role).copied().ok_or_else(|| {
                ChainError::submission(format!("{}: missing account role `{role}`", call.name))
            })
        };

        match slot.source {
            AccountSource::Role { role } => required(role),
            AccountSource::Program { program } => Ok(call
                .role_address(slot.name)
                .copied()
                .unwrap_or_else(|| self.program(program))),
            AccountSource::Pda { seed, of_role, program } => {
                let base = required(of_role)?;
                pda::derive_with_seeds(&[seed.as_bytes(), base.as_ref()], &self.program(program))
                    .map(|d| d.address)
                    .map_err(|e| ChainError::submission(e.to_string()))
            }
        }
    }

    /// Build the program instruction for `call`.
    ///
    /// Unknown instruction names and missing roles are submission errors:
    /// nothing was signed or sent.
    pub fn build_instruction(&self, call: &InstructionCall) -> Result<Instruction, ChainError> {
        let schema = lookup(&call.name)
            .ok_or_else(|| ChainError::submission(format!("unknown instruction `{}`", call.name)))?;

        let mut accounts = Vec::with_capacity(schema.accounts.len());
        for slot in schema.accounts {
            let key = self.resolve(slot, call)?;
            accounts.push(if slot.writable {
                AccountMeta::new(key, slot.signer)
            } else {
                AccountMeta::new_readonly(key, slot.signer)
            });
        }

        let mut data = instruction_discriminator(schema.name).to_vec();
        if let Some(args) = &call.args {
            data.extend_from_slice(args);
        }

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data,
        })
    }

    /// Whether `owner` may own a counter account (before or after delegation).
    pub fn is_counter_owner(&self, owner: &Pubkey) -> bool {
        *owner == self.program_id || *owner == self.delegation_program_id
    }
}

/// Decode counter account bytes.
pub fn decode_counter(data: &[u8]) -> Result<CounterAccount, ChainError> {
    if data.len() < COUNTER_ACCOUNT_LEN {
        return Err(ChainError::decode(format!(
            "counter account too short: {} bytes, expected {COUNTER_ACCOUNT_LEN}",
            data.len()
        )));
    }

    let expected = account_discriminator(COUNTER_ACCOUNT);
    if data[..DISCRIMINATOR_LEN] != expected {
        return Err(ChainError::decode(format!(
            "counter account discriminator mismatch: got {}, expected {}",
            hex::encode(&data[..DISCRIMINATOR_LEN]),
            hex::encode(expected)
        )));
    }

    let count: u64 = bincode::deserialize(&data[DISCRIMINATOR_LEN..COUNTER_ACCOUNT_LEN])
        .map_err(|e| ChainError::decode(format!("counter field: {e}")))?;
    Ok(CounterAccount { count })
}

/// Encode counter account bytes the way the program stores them.
pub fn encode_counter(account: &CounterAccount) -> Result<Vec<u8>, ChainError> {
    let mut out = account_discriminator(COUNTER_ACCOUNT).to_vec();
    let payload = bincode::serialize(&account.count)
        .map_err(|e| ChainError::decode(format!("serialize counter: {e}")))?;
    out.extend_from_slice(&payload);
    Ok(out)
}
