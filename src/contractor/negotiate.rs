use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use tracing::{debug, error};

use crate::dialer::Connection;
use crate::host::{HostDb, HostDescriptor, HostSettings};
use crate::ledger::{
    ContractRevision, LedgerPublicKey, StorageContract, Transaction, UnlockConditions,
};
use crate::wallet::{FundingTransaction, TransactionPool, TxPoolError, WalletError};
use crate::wire::{
    self, ACCEPT_RESPONSE, MAX_RESPONSE_LEN, MAX_SETTINGS_LEN, MAX_TXN_SET_LEN, WireError,
};

use super::error::FormationError;
use super::types::Contract;

/// Read the host's signed settings from `conn`, verify them against its
/// declared key, and return the descriptor with the settings sub-record
/// refreshed. Divergence from the cached settings is reported to the host
/// database.
pub(crate) async fn verify_settings<C, H>(
    conn: &mut C,
    mut host: HostDescriptor,
    hostdb: &H,
) -> Result<HostDescriptor, FormationError>
where
    C: Connection,
    H: HostDb,
{
    if !host.public_key.is_supported() {
        // upstream filtering is supposed to make this unreachable
        error!(
            host = %host.net_address,
            algorithm = %host.public_key.algorithm,
            "host database did not filter out a host with an unsupported signature algorithm",
        );
        return Err(FormationError::UnsupportedKeyAlgorithm(
            host.public_key.algorithm.clone(),
        ));
    }
    let key = host
        .public_key
        .verifying_key()
        .ok_or(WireError::BadSignature)?;

    let settings: HostSettings = wire::read_signed_object(conn, MAX_SETTINGS_LEN, &key).await?;
    if !settings.accepting_contracts {
        return Err(FormationError::NotAcceptingContracts);
    }
    if settings != host.settings {
        hostdb.notify_settings_discrepancy(&host.public_key, &host.settings, &settings);
    }
    host.settings = settings;
    Ok(host)
}

/// Drive the negotiation exchange for one contract: sign and send our
/// half, read the host's countersigned half, submit it to the pool, and
/// assemble the accepted contract record.
pub(crate) async fn negotiate_contract<C, T>(
    conn: &mut C,
    host: &HostDescriptor,
    mut terms: StorageContract,
    draft: &mut dyn FundingTransaction,
    tpool: &T,
) -> Result<Contract, FormationError>
where
    C: Connection,
    T: TransactionPool,
{
    // this key signs revisions of this contract only, never another
    let secret_key = SigningKey::generate(&mut OsRng);
    let our_key = LedgerPublicKey::ed25519(&secret_key.verifying_key());

    let unlock_conditions = UnlockConditions::two_of_two(our_key, host.public_key.clone());
    terms.unlock_hash = unlock_conditions.unlock_hash();

    if let Err(e) = draft.fund(terms.payout) {
        let _ = wire::write_object(conn, "internal error").await;
        return Err(e.into());
    }
    draft.add_contract(terms.clone());

    let signed_set = draft.sign(false)?;
    let funding_txn = signed_set.last().ok_or_else(|| {
        FormationError::Wallet(WalletError::Internal(
            "wallet produced an empty transaction set".to_string(),
        ))
    })?;
    let id = funding_txn.contract_id(0);

    wire::write_object(conn, ACCEPT_RESPONSE).await?;
    wire::write_object(conn, &signed_set).await?;

    let response: String = wire::read_object(conn, MAX_RESPONSE_LEN).await?;
    if response != ACCEPT_RESPONSE {
        return Err(FormationError::HostRejected(response));
    }
    let host_set: Vec<Transaction> = wire::read_object(conn, MAX_TXN_SET_LEN).await?;

    match tpool.accept_transaction_set(host_set) {
        // already reached the pool through another path
        Ok(()) | Err(TxPoolError::DuplicateTransactionSet) => {}
        Err(e) => return Err(FormationError::TransactionPool(e)),
    }

    debug!(host = %host.net_address, contract = %id, "contract negotiated");

    Ok(Contract {
        id,
        host_address: host.net_address.clone(),
        last_revision: ContractRevision::initial(id, unlock_conditions, &terms),
        last_revision_txn: Transaction::default(),
        secret_key: secret_key.to_bytes(),
        terms,
    })
}
