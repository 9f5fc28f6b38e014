mod error;
mod form;
mod negotiate;
mod types;

pub use error::FormationError;
pub use types::{Allowance, Contract};

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialer::Dialer;
use crate::host::HostDb;
use crate::ledger::{BlockHeight, ContractId, Currency, UnlockHash};
use crate::persist::{PersistError, Persister};
use crate::wallet::{TransactionPool, Wallet};

/// Deadline covering the whole settings-verification and negotiation
/// exchange on one connection.
pub const NEGOTIATE_TIMEOUT: Duration = Duration::from_secs(30);
/// Bound on connection establishment, separate from the negotiation
/// deadline.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(15);
/// Fixed-size storage unit used for pricing and capacity arithmetic.
pub const SECTOR_SIZE: u64 = 1 << 22;
/// Contracts are never formed with hosts asking more than this price per
/// byte per block.
pub const MAX_STORAGE_PRICE: Currency = Currency::new(10_000);

/// The durable image of the contractor's state. Also serves as the live
/// in-memory state behind the lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractorSnapshot {
    pub contracts: HashMap<ContractId, Contract>,
    pub spent_period: Currency,
    pub spent_total: Currency,
    /// Address reserved for the next formation attempt; at most one
    /// reservation is outstanding at a time.
    pub cached_address: Option<UnlockHash>,
    pub block_height: BlockHeight,
    pub renew_height: BlockHeight,
}

/// Forms and tracks storage contracts on behalf of the renter.
pub struct Contractor<W, H, T, D, P> {
    wallet: W,
    hostdb: H,
    tpool: T,
    dialer: D,
    persister: P,
    state: Mutex<ContractorSnapshot>,
}

impl<W, H, T, D, P> Contractor<W, H, T, D, P>
where
    W: Wallet,
    H: HostDb,
    T: TransactionPool,
    D: Dialer,
    P: Persister,
{
    /// Restore the contractor from its persister, or start empty.
    pub fn new(wallet: W, hostdb: H, tpool: T, dialer: D, persister: P) -> Result<Self, PersistError> {
        let state = persister.load()?.unwrap_or_default();
        Ok(Contractor {
            wallet,
            hostdb,
            tpool,
            dialer,
            persister,
            state: Mutex::new(state),
        })
    }

    /// Record a new consensus height.
    pub fn update_height(&self, height: BlockHeight) -> Result<(), PersistError> {
        let mut state = self.lock();
        state.block_height = height;
        self.persister.save(&state)
    }

    pub fn current_height(&self) -> BlockHeight {
        self.lock().block_height
    }

    pub fn renew_height(&self) -> BlockHeight {
        self.lock().renew_height
    }

    /// Coins committed to contracts this period and over the contractor's
    /// lifetime.
    pub fn spending(&self) -> (Currency, Currency) {
        let state = self.lock();
        (state.spent_period, state.spent_total)
    }

    pub fn contracts(&self) -> Vec<Contract> {
        self.lock().contracts.values().cloned().collect()
    }

    pub fn snapshot(&self) -> ContractorSnapshot {
        self.lock().clone()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ContractorSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
