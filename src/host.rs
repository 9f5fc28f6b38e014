use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::{BlockHeight, Currency, LedgerPublicKey, UnlockHash};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetAddress(pub String);

impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NetAddress {
    fn from(value: &str) -> Self {
        NetAddress(value.to_string())
    }
}

/// A host's advertised capabilities and prices, as signed by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSettings {
    pub accepting_contracts: bool,
    pub max_duration: BlockHeight,
    pub window_size: BlockHeight,
    pub remaining_storage: u64,
    /// Price per byte per block.
    pub storage_price: Currency,
    /// Flat collateral offer per contract.
    pub collateral: Currency,
    pub unlock_hash: UnlockHash,
}

/// A known host as recorded by the reputation database. Read-mostly; the
/// settings sub-record is refreshed in place after verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    pub net_address: NetAddress,
    pub public_key: LedgerPublicKey,
    pub settings: HostSettings,
}

/// The host reputation database consumed by the contractor.
pub trait HostDb: Send + Sync {
    /// Sample up to `n` distinct candidate hosts, excluding the given
    /// addresses.
    fn random_hosts(&self, n: usize, exclude: &[NetAddress]) -> Vec<HostDescriptor>;

    /// Fire-and-forget notification that a host's freshly verified
    /// settings diverge from the cached ones.
    fn notify_settings_discrepancy(
        &self,
        host: &LedgerPublicKey,
        cached: &HostSettings,
        verified: &HostSettings,
    );
}
