use std::io;

use thiserror::Error;

use crate::ledger::CurrencyError;
use crate::persist::PersistError;
use crate::wallet::{TxPoolError, WalletError};
use crate::wire::WireError;

#[derive(Debug, Error)]
pub enum FormationError {
    #[error("host price is above the configured maximum")]
    TooExpensive,
    #[error("contract cannot end at or before the current block height")]
    InvalidEndHeight,
    #[error("host is not accepting contracts")]
    NotAcceptingContracts,
    /// The host database is expected to filter these out; seeing one here
    /// indicates an upstream defect, not a bad host.
    #[error("host announced an unsupported signature algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),
    #[error("invalid allowance: {0}")]
    InvalidAllowance(&'static str),
    #[error("allowance cannot cover one sector per host for the full period")]
    InsufficientAllowance,
    #[error("allowance resulted in an unrepresentably large contract size")]
    AllowanceTooLarge,
    #[error("only {available} of the required {required} hosts are known")]
    NotEnoughHosts { available: u64, required: u64 },
    #[error("host rejected the proposed contract: {0}")]
    HostRejected(String),
    #[error("failed to dial host: {0}")]
    Dial(#[source] io::Error),
    #[error("negotiation deadline exceeded")]
    Deadline,
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("transaction pool rejected the contract transaction: {0}")]
    TransactionPool(#[source] TxPoolError),
    #[error(transparent)]
    Currency(#[from] CurrencyError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl FormationError {
    /// Policy rejections are never retried; everything else is a
    /// transient per-host failure the set manager may skip past.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            FormationError::TooExpensive
                | FormationError::InvalidEndHeight
                | FormationError::NotAcceptingContracts
                | FormationError::InvalidAllowance(_)
                | FormationError::InsufficientAllowance
                | FormationError::AllowanceTooLarge
                | FormationError::NotEnoughHosts { .. }
        )
    }
}
