//! User-facing vault operations.
//!
//! Each operation harvests first, so every conversion reads a ratio that
//! already includes accrued yield. Ledger edits are staged on copies of the
//! index and balances and written back only when every step succeeded; any
//! error leaves the caller's state exactly as it was.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::harvester::harvest;
use crate::pool::PoolAdapter;
use crate::state::{IndexState, RealBalance};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepositOutcome {
    pub harvested: u64,
    pub virtual_amount: u64,
    pub real_amount: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub harvested: u64,
    pub real_amount: u64,
    pub virtual_amount: u64,
    pub asset_amount: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    pub harvested: u64,
    pub real_amount: u64,
}

/// Deposit `asset_amount` into the pool and credit the real units it buys.
///
/// Fails with `BootstrapViolation` when the first deposit of an index is
/// below its floor, `ZeroOutput` when the deposit would mint nothing, and
/// `SlippageExceeded` when fewer than `min_real_out` real units are minted.
pub fn deposit<P: PoolAdapter>(
    index: &mut IndexState,
    depositor: &mut RealBalance,
    pool: &mut P,
    asset_amount: u64,
    min_real_out: u64,
) -> Result<DepositOutcome> {
    require!(asset_amount > 0, VaultError::InvalidAmount);

    let mut staged_index = index.clone();
    let mut staged_depositor = depositor.clone();

    let harvested = harvest(&mut staged_index, pool)?;

    require!(pool.can_deposit(), VaultError::DepositsPaused);
    if staged_index.is_bootstrap() {
        require_gte!(
            staged_index.to_internal(asset_amount)?,
            staged_index.bootstrap_floor,
            VaultError::BootstrapViolation
        );
    }

    let virtual_amount = pool.deposit(asset_amount)?;
    let real_amount = staged_index.snapshot().virtual_to_real(virtual_amount)?;
    // the pool took assets but produced nothing to mint against
    require!(real_amount > 0, VaultError::ZeroOutput);
    require_gte!(real_amount, min_real_out, VaultError::SlippageExceeded);

    staged_index.add_virtual(virtual_amount)?;
    staged_index.credit_real(&mut staged_depositor, real_amount)?;

    *index = staged_index;
    *depositor = staged_depositor;

    Ok(DepositOutcome {
        harvested,
        virtual_amount,
        real_amount,
    })
}

/// Burn `real_amount` real units and redeem their virtual units from the pool.
///
/// The ledger is debited before the pool call. Deposits being disabled
/// never blocks this path.
///
/// Fails with `InsufficientBalance` when the owner holds fewer than
/// `real_amount`, `ZeroOutput` when the burn releases no virtual units or
/// the pool returns no assets (even with `min_asset_out == 0`),
/// `WithdrawalsPaused` when the pool refuses redemptions, and
/// `SlippageExceeded` when fewer than `min_asset_out` assets come back.
pub fn withdraw<P: PoolAdapter>(
    index: &mut IndexState,
    owner: &mut RealBalance,
    pool: &mut P,
    real_amount: u64,
    min_asset_out: u64,
) -> Result<WithdrawOutcome> {
    require!(real_amount > 0, VaultError::InvalidAmount);

    let mut staged_index = index.clone();
    let mut staged_owner = owner.clone();

    let harvested = harvest(&mut staged_index, pool)?;

    require_gte!(
        staged_owner.amount,
        real_amount,
        VaultError::InsufficientBalance
    );
    let virtual_amount = staged_index.snapshot().real_to_virtual(real_amount)?;

    staged_index.debit_real(&mut staged_owner, real_amount)?;
    staged_index.remove_virtual(virtual_amount)?;

    require!(pool.can_withdraw(), VaultError::WithdrawalsPaused);
    let asset_amount = pool.withdraw(virtual_amount)?;
    require!(asset_amount > 0, VaultError::ZeroOutput);
    require_gte!(asset_amount, min_asset_out, VaultError::SlippageExceeded);

    *index = staged_index;
    *owner = staged_owner;

    Ok(WithdrawOutcome {
        harvested,
        real_amount,
        virtual_amount,
        asset_amount,
    })
}

/// Move real units between two balances of the same index.
pub fn transfer<P: PoolAdapter>(
    index: &mut IndexState,
    from: &mut RealBalance,
    to: &mut RealBalance,
    pool: &mut P,
    real_amount: u64,
) -> Result<TransferOutcome> {
    require!(real_amount > 0, VaultError::InvalidAmount);

    let mut staged_index = index.clone();
    let mut staged_from = from.clone();
    let mut staged_to = to.clone();

    let harvested = harvest(&mut staged_index, pool)?;

    staged_index.debit_real(&mut staged_from, real_amount)?;
    staged_index.credit_real(&mut staged_to, real_amount)?;

    *index = staged_index;
    *from = staged_from;
    *to = staged_to;

    Ok(TransferOutcome {
        harvested,
        real_amount,
    })
}

/// Transfer between two sub-accounts of one owner.
pub fn sub_transfer<P: PoolAdapter>(
    index: &mut IndexState,
    from: &mut RealBalance,
    to: &mut RealBalance,
    pool: &mut P,
    real_amount: u64,
) -> Result<TransferOutcome> {
    require_keys_eq!(from.owner, to.owner, VaultError::Unauthorized);
    require_neq!(from.sub_account, to.sub_account, VaultError::SelfTransfer);

    transfer(index, from, to, pool, real_amount)
}
