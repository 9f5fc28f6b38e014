use serde::{Deserialize, Serialize};

use crate::host::NetAddress;
use crate::ledger::{BlockHeight, ContractId, ContractRevision, Currency, StorageContract, Transaction};

use super::error::FormationError;

/// The renter's budget and targets for one formation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    pub funds: Currency,
    pub hosts: u64,
    /// Contract duration in blocks.
    pub period: BlockHeight,
    /// How many blocks before expiry contracts become eligible for
    /// renewal.
    pub renew_window: BlockHeight,
}

impl Allowance {
    pub fn validate(&self) -> Result<(), FormationError> {
        if self.funds.is_zero() {
            return Err(FormationError::InvalidAllowance("funds must be positive"));
        }
        if self.hosts == 0 {
            return Err(FormationError::InvalidAllowance(
                "host count must be positive",
            ));
        }
        if self.period == 0 {
            return Err(FormationError::InvalidAllowance("period must be positive"));
        }
        if self.renew_window == 0 {
            return Err(FormationError::InvalidAllowance(
                "renew window must be positive",
            ));
        }
        if self.renew_window >= self.period {
            return Err(FormationError::InvalidAllowance(
                "renew window must be shorter than the period",
            ));
        }
        Ok(())
    }
}

/// An accepted storage contract as tracked by the contractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub host_address: NetAddress,
    pub terms: StorageContract,
    pub last_revision: ContractRevision,
    pub last_revision_txn: Transaction,
    /// Seed of the renter's ephemeral signing key for this contract.
    pub secret_key: [u8; 32],
}
