use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::currency::Currency;

pub type BlockHeight = u64;

/// The only signature scheme hosts may announce on the ledger.
pub const ALGORITHM_ED25519: &str = "ed25519";
pub const ED25519_KEY_LEN: usize = 32;

/// Height at which the levy started being rounded down to whole
/// `TAX_GRANULARITY` multiples.
pub const TAX_ROUNDING_HEIGHT: BlockHeight = 21_000;
pub const TAX_GRANULARITY: u128 = 10_000;
const TAX_RATE_NUM: u128 = 39;
const TAX_RATE_DENOM: u128 = 1000;

macro_rules! hash_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
                let bytes: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom("expected a 32 byte digest"))?;
                Ok($name(bytes))
            }
        }
    };
}

hash_newtype!(Hash256);
hash_newtype!(UnlockHash);
hash_newtype!(ContractId);

impl UnlockHash {
    /// The burn address: coins routed here are unspendable.
    pub const VOID: UnlockHash = UnlockHash([0u8; 32]);
}

/// An algorithm-tagged public key as announced on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPublicKey {
    pub algorithm: String,
    pub key: Vec<u8>,
}

impl LedgerPublicKey {
    pub fn ed25519(key: &VerifyingKey) -> Self {
        LedgerPublicKey {
            algorithm: ALGORITHM_ED25519.to_string(),
            key: key.to_bytes().to_vec(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.algorithm == ALGORITHM_ED25519 && self.key.len() == ED25519_KEY_LEN
    }

    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        if !self.is_supported() {
            return None;
        }
        let bytes: [u8; ED25519_KEY_LEN] = self.key.as_slice().try_into().ok()?;
        VerifyingKey::from_bytes(&bytes).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockConditions {
    pub public_keys: Vec<LedgerPublicKey>,
    pub signatures_required: u64,
}

impl UnlockConditions {
    pub fn two_of_two(renter: LedgerPublicKey, host: LedgerPublicKey) -> Self {
        UnlockConditions {
            public_keys: vec![renter, host],
            signatures_required: 2,
        }
    }

    pub fn unlock_hash(&self) -> UnlockHash {
        let mut hasher = Sha256::new();
        hasher.update(b"berth/unlock-conditions");
        hasher.update(canonical_bytes(self));
        UnlockHash(hasher.finalize().into())
    }
}

/// A conditional payout of a storage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: Currency,
    pub unlock_hash: UnlockHash,
}

/// The terms of a storage agreement. Index 0 of both output lists pays the
/// renter, index 1 the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageContract {
    pub file_size: u64,
    pub file_root: Hash256,
    pub window_start: BlockHeight,
    pub window_end: BlockHeight,
    pub payout: Currency,
    pub unlock_hash: UnlockHash,
    pub revision_number: u64,
    pub valid_proof_outputs: Vec<Output>,
    pub missed_proof_outputs: Vec<Output>,
}

/// A re-signed update to a contract's terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRevision {
    pub parent_id: ContractId,
    pub unlock_conditions: UnlockConditions,
    pub revision_number: u64,
    pub file_size: u64,
    pub file_root: Hash256,
    pub window_start: BlockHeight,
    pub window_end: BlockHeight,
    pub valid_proof_outputs: Vec<Output>,
    pub missed_proof_outputs: Vec<Output>,
    pub unlock_hash: UnlockHash,
}

impl ContractRevision {
    /// The revision-0 mirror of freshly agreed terms.
    pub fn initial(
        parent_id: ContractId,
        unlock_conditions: UnlockConditions,
        terms: &StorageContract,
    ) -> Self {
        ContractRevision {
            parent_id,
            unlock_conditions,
            revision_number: terms.revision_number,
            file_size: terms.file_size,
            file_root: terms.file_root,
            window_start: terms.window_start,
            window_end: terms.window_end,
            valid_proof_outputs: terms.valid_proof_outputs.clone(),
            missed_proof_outputs: terms.missed_proof_outputs.clone(),
            unlock_hash: terms.unlock_hash,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub parent_id: Hash256,
    pub covers_whole_transaction: bool,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub outputs: Vec<Output>,
    pub contracts: Vec<StorageContract>,
    pub signatures: Vec<TransactionSignature>,
}

impl Transaction {
    /// The identifier of the storage contract at `index`. Commits to the
    /// transaction body, not its signatures, so the id is stable across
    /// countersigning.
    pub fn contract_id(&self, index: usize) -> ContractId {
        let body = Transaction {
            outputs: self.outputs.clone(),
            contracts: self.contracts.clone(),
            signatures: Vec::new(),
        };
        let mut hasher = Sha256::new();
        hasher.update(b"berth/storage-contract");
        hasher.update(canonical_bytes(&body));
        hasher.update((index as u64).to_le_bytes());
        ContractId(hasher.finalize().into())
    }
}

/// The ledger's mandatory levy on contract payouts.
pub fn tax(height: BlockHeight, payout: Currency) -> Currency {
    let raw = payout.as_base_units() / TAX_RATE_DENOM * TAX_RATE_NUM;
    let levy = if height >= TAX_ROUNDING_HEIGHT {
        raw / TAX_GRANULARITY * TAX_GRANULARITY
    } else {
        raw
    };
    Currency::from_base_units(levy)
}

pub fn post_tax(height: BlockHeight, payout: Currency) -> Currency {
    Currency::from_base_units(payout.as_base_units() - tax(height, payout).as_base_units())
}

fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    let mut buffer = Vec::new();
    ciborium::into_writer(value, &mut buffer).expect("in-memory cbor encoding cannot fail");
    buffer
}
