pub mod currency;
pub mod types;

pub use currency::{Currency, CurrencyError};
pub use types::{
    ALGORITHM_ED25519, BlockHeight, ContractId, ContractRevision, ED25519_KEY_LEN, Hash256,
    LedgerPublicKey, Output, StorageContract, Transaction, TransactionSignature, UnlockConditions,
    UnlockHash, post_tax, tax,
};
