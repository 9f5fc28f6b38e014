use thiserror::Error;

use crate::ledger::{Currency, StorageContract, Transaction, UnlockConditions};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet has insufficient funds")]
    InsufficientFunds,
    #[error("wallet is locked")]
    Locked,
    #[error("wallet failure: {0}")]
    Internal(String),
}

/// The ledger wallet consumed by the contractor.
pub trait Wallet: Send + Sync {
    /// Reserve a fresh address for receiving contract payouts.
    fn next_address(&self) -> Result<UnlockConditions, WalletError>;

    /// Start a funding-transaction draft. The draft owns any ledger
    /// outputs it reserves until it is signed or discarded.
    fn start_transaction(&self) -> Box<dyn FundingTransaction>;
}

/// A private, per-attempt funding-transaction draft.
pub trait FundingTransaction: Send {
    /// Reserve wallet outputs covering `amount`.
    fn fund(&mut self, amount: Currency) -> Result<(), WalletError>;

    fn add_contract(&mut self, contract: StorageContract);

    /// Sign the draft with the wallet's keys and return the transaction
    /// set, the draft's transaction last.
    fn sign(&mut self, whole_transaction: bool) -> Result<Vec<Transaction>, WalletError>;

    /// Return every reserved output to the wallet's available pool. Must
    /// be called on every failure path.
    fn discard(self: Box<Self>);
}

#[derive(Debug, Error)]
pub enum TxPoolError {
    #[error("transaction set is already in the pool")]
    DuplicateTransactionSet,
    #[error("transaction set rejected: {0}")]
    Rejected(String),
}

/// The ledger transaction-broadcast pool.
pub trait TransactionPool: Send + Sync {
    fn accept_transaction_set(&self, txns: Vec<Transaction>) -> Result<(), TxPoolError>;
}
