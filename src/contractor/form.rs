use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::dialer::Dialer;
use crate::host::{HostDb, HostDescriptor};
use crate::ledger::{BlockHeight, Currency, Hash256, Output, StorageContract, UnlockHash, post_tax};
use crate::persist::Persister;
use crate::wallet::{FundingTransaction, TransactionPool, Wallet};
use crate::wire;

use super::error::FormationError;
use super::negotiate;
use super::types::{Allowance, Contract};
use super::{Contractor, DIAL_TIMEOUT, MAX_STORAGE_PRICE, NEGOTIATE_TIMEOUT, SECTOR_SIZE};

impl<W, H, T, D, P> Contractor<W, H, T, D, P>
where
    W: Wallet,
    H: HostDb,
    T: TransactionPool,
    D: Dialer,
    P: Persister,
{
    /// Negotiate an initial storage contract of `filesize` bytes with
    /// `host`, ending at `end_height`, and commit it to the contractor's
    /// state.
    pub async fn form_contract(
        &self,
        host: HostDescriptor,
        filesize: u64,
        end_height: BlockHeight,
    ) -> Result<Contract, FormationError> {
        // cost rejection happens before any network i/o or reservation
        if host.settings.storage_price > MAX_STORAGE_PRICE {
            return Err(FormationError::TooExpensive);
        }

        let (our_address, height) = {
            let mut state = self.lock();
            let address = match state.cached_address {
                Some(address) => address,
                None => {
                    let address = self.wallet.next_address()?.unlock_hash();
                    state.cached_address = Some(address);
                    address
                }
            };
            (address, state.block_height)
        };
        if end_height <= height {
            return Err(FormationError::InvalidEndHeight);
        }
        let duration = end_height - height;

        let rent_cost = host
            .settings
            .storage_price
            .checked_mul(filesize.into())?
            .checked_mul(duration.into())?;
        let payout = rent_cost.checked_add(host.settings.collateral)?;
        let renter_payout = post_tax(height, rent_cost);

        let terms = StorageContract {
            file_size: 0,
            file_root: Hash256::default(),
            window_start: end_height,
            window_end: end_height + host.settings.window_size,
            payout,
            // bound to the two-of-two policy during negotiation
            unlock_hash: UnlockHash::default(),
            revision_number: 0,
            valid_proof_outputs: vec![
                Output {
                    value: renter_payout,
                    unlock_hash: our_address,
                },
                // the host stakes its own collateral, none is pre-funded
                Output {
                    value: Currency::ZERO,
                    unlock_hash: host.settings.unlock_hash,
                },
            ],
            missed_proof_outputs: vec![
                Output {
                    value: renter_payout,
                    unlock_hash: our_address,
                },
                Output {
                    value: Currency::ZERO,
                    unlock_hash: UnlockHash::VOID,
                },
            ],
        };

        let mut conn = self
            .dialer
            .dial(&host.net_address, DIAL_TIMEOUT)
            .await
            .map_err(FormationError::Dial)?;

        let mut draft: Option<Box<dyn FundingTransaction>> = None;
        let outcome = timeout(NEGOTIATE_TIMEOUT, async {
            wire::write_rpc_id(&mut conn, wire::RPC_FORM_CONTRACT).await?;
            let host = negotiate::verify_settings(&mut conn, host, &self.hostdb).await?;
            let draft = draft.insert(self.wallet.start_transaction());
            negotiate::negotiate_contract(&mut conn, &host, terms, draft.as_mut(), &self.tpool)
                .await
        })
        .await
        .unwrap_or(Err(FormationError::Deadline));

        match outcome {
            Ok(contract) => {
                let mut state = self.lock();
                let spent_period = state.spent_period.checked_add(payout)?;
                let spent_total = state.spent_total.checked_add(payout)?;
                state.contracts.insert(contract.id, contract.clone());
                state.spent_period = spent_period;
                state.spent_total = spent_total;
                state.cached_address = None;
                if let Err(e) = self.persister.save(&state) {
                    error!(error = %e, "failed to persist contractor state after forming a contract");
                    return Err(e.into());
                }
                Ok(contract)
            }
            Err(e) => {
                // return reserved outputs to the wallet; the cached
                // address was never consumed and stays for the next
                // attempt
                if let Some(draft) = draft.take() {
                    draft.discard();
                }
                Err(e)
            }
        }
    }

    /// Form enough contracts to satisfy `allowance`, tolerating
    /// individual host failures. Partial success is a terminal outcome of
    /// the pass, not an error.
    pub async fn form_contracts(
        &self,
        allowance: Allowance,
        cancel: CancellationToken,
    ) -> Result<Vec<Contract>, FormationError> {
        allowance.validate()?;

        // oversample to survive per-host failures
        let want = (allowance.hosts as usize).saturating_mul(2);
        let candidates = self.hostdb.random_hosts(want, &[]);
        if (candidates.len() as u64) < allowance.hosts {
            return Err(FormationError::NotEnoughHosts {
                available: candidates.len() as u64,
                required: allowance.hosts,
            });
        }

        let mut sum = Currency::ZERO;
        for host in &candidates {
            sum = sum.checked_add(host.settings.storage_price)?;
        }
        let mean_price = sum.checked_div((candidates.len() as u64).into())?;

        let filesize =
            host_allotment(allowance.funds, mean_price, allowance.hosts, allowance.period)?;
        let end_height = self.current_height() + allowance.period;

        let mut formed = Vec::new();
        for host in candidates {
            if cancel.is_cancelled() {
                info!("formation pass cancelled");
                break;
            }
            let address = host.net_address.clone();
            match self.form_contract(host, filesize, end_height).await {
                Ok(contract) => {
                    formed.push(contract);
                    if formed.len() as u64 >= allowance.hosts {
                        break;
                    }
                }
                Err(e) => warn!(host = %address, error = %e, "failed to negotiate contract"),
            }
        }

        {
            let mut state = self.lock();
            state.renew_height = end_height;
            self.persister.save(&state)?;
        }

        info!(
            formed = formed.len(),
            target = allowance.hosts,
            "formation pass complete",
        );
        Ok(formed)
    }
}

/// Convert an allowance into a per-host contract size, rounded down to a
/// whole number of sectors. The sampled population's mean price stands in
/// for the prices of the hosts actually used.
fn host_allotment(
    funds: Currency,
    mean_price: Currency,
    hosts: u64,
    period: BlockHeight,
) -> Result<u64, FormationError> {
    let cost_per_host = mean_price
        .checked_mul(hosts.into())?
        .checked_mul(SECTOR_SIZE.into())?
        .checked_mul(period.into())?;
    if cost_per_host.is_zero() {
        return Err(FormationError::AllowanceTooLarge);
    }
    if funds < cost_per_host {
        return Err(FormationError::InsufficientAllowance);
    }
    let sectors = funds
        .checked_div(cost_per_host)?
        .to_u64()
        .map_err(|_| FormationError::AllowanceTooLarge)?;
    sectors
        .checked_mul(SECTOR_SIZE)
        .ok_or(FormationError::AllowanceTooLarge)
}
