//! `ChainClient` over Solana JSON-RPC.
//!
//! Submits one instruction per transaction, signed by the borrowed wallet and
//! confirmed at the configured commitment. Errors are classified into the
//! `ChainError` taxonomy; nothing is retried here.

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::InstructionError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::{Transaction, TransactionError};

use tally_core::chain::{ChainClient, CounterAccount, InstructionCall, TransactionResult, WalletSigner};
use tally_core::config::{validate_config, Commitment, SessionConfig};
use tally_core::{ChainError, TallyResult};

use crate::schema::{self, ProgramInterface};

pub fn commitment_config(level: Commitment) -> CommitmentConfig {
    match level {
        Commitment::Processed => CommitmentConfig::processed(),
        Commitment::Confirmed => CommitmentConfig::confirmed(),
        Commitment::Finalized => CommitmentConfig::finalized(),
    }
}

/// Map an RPC client failure onto the remote-call taxonomy.
///
/// Only an instruction error came back from the program. Runtime conditions
/// that clear on their own (stale blockhash, contended or saturated block) are
/// treated like transport failures. Any other transaction error means the
/// runtime refused the transaction itself (fee payer, signatures, account
/// set) before the program ran.
pub fn classify_client_error(err: &ClientError) -> ChainError {
    if let Some(tx_err) = err.get_transaction_error() {
        return classify_transaction_error(tx_err);
    }

    match err.kind() {
        ClientErrorKind::SigningError(e) => ChainError::submission(e.to_string()),
        _ => ChainError::network(err.to_string()),
    }
}

fn classify_transaction_error(tx_err: TransactionError) -> ChainError {
    match tx_err {
        TransactionError::InstructionError(_, ref ix_err) => {
            let code = match ix_err {
                InstructionError::Custom(code) => Some(*code),
                _ => None,
            };
            ChainError::program(code, tx_err.to_string())
        }
        TransactionError::BlockhashNotFound
        | TransactionError::AccountInUse
        | TransactionError::ClusterMaintenance
        | TransactionError::WouldExceedMaxBlockCostLimit
        | TransactionError::WouldExceedMaxAccountCostLimit
        | TransactionError::WouldExceedAccountDataBlockLimit
        | TransactionError::WouldExceedAccountDataTotalLimit => ChainError::network(tx_err.to_string()),
        _ => ChainError::submission(tx_err.to_string()),
    }
}

pub struct RpcChainClient {
    rpc: RpcClient,
    interface: ProgramInterface,
    commitment: CommitmentConfig,
}

impl RpcChainClient {
    pub fn new(config: &SessionConfig) -> TallyResult<Self> {
        validate_config(config)?;
        let commitment = commitment_config(config.commitment);
        Ok(Self {
            rpc: RpcClient::new_with_commitment(config.rpc_url.clone(), commitment),
            interface: ProgramInterface::new(config.program_id()?),
            commitment,
        })
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }

    /// Build and sign a single-instruction transaction paid by the signer.
    pub fn build_transaction(
        &self,
        call: &InstructionCall,
        signer: &WalletSigner,
        blockhash: Hash,
    ) -> Result<Transaction, ChainError> {
        let ix = self.interface.build_instruction(call)?;
        let mut tx = Transaction::new_with_payer(&[ix], Some(&signer.pubkey()));
        let signers: [&WalletSigner; 1] = [signer];
        tx.try_sign(&signers[..], blockhash)
            .map_err(|e| ChainError::submission(e.to_string()))?;
        Ok(tx)
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    #[tracing::instrument(skip_all, fields(instruction = %call.name))]
    async fn submit(
        &self,
        call: &InstructionCall,
        signer: &WalletSigner,
    ) -> Result<TransactionResult, ChainError> {
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| classify_client_error(&e))?;

        let tx = self.build_transaction(call, signer, blockhash)?;
        let signature = self
            .rpc
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(|e| {
                let classified = classify_client_error(&e);
                tracing::warn!(error = %e, ?classified, "transaction failed");
                classified
            })?;

        tracing::debug!(%signature, commitment = ?self.commitment.commitment, "transaction confirmed");
        Ok(TransactionResult { signature })
    }

    #[tracing::instrument(skip_all, fields(%address))]
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<CounterAccount>, ChainError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| classify_client_error(&e))?;

        let Some(account) = response.value else {
            return Ok(None);
        };

        if !self.interface.is_counter_owner(&account.owner) {
            return Err(ChainError::decode(format!(
                "account {address} is owned by {}, not the counter program",
                account.owner
            )));
        }

        schema::decode_counter(&account.data).map(Some)
    }
}
