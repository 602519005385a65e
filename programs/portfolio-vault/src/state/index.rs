use anchor_lang::prelude::*;

use crate::constants::INTERNAL_DECIMALS;
use crate::error::VaultError;

/// Accounting state of one asset/pool pairing.
///
/// `virtual_total` counts pool share units attributed to the index and
/// `real_total` counts the claim units issued against them. The ratio
/// between the two is the value of one real unit.
#[account]
pub struct IndexState {
    /// Underlying asset deposited into the pool
    pub asset_mint: Pubkey,
    /// External pool program
    pub pool_program: Pubkey,
    /// External pool state account, owned by `pool_program`
    pub pool_state: Pubkey,
    /// Mint of the pool's yield-bearing share (virtual unit)
    pub pool_share_mint: Pubkey,
    /// Custody account for the asset, owned by the vault authority
    pub vault_asset_account: Pubkey,
    /// Custody account for pool shares, owned by the vault authority
    pub vault_share_account: Pubkey,
    /// Virtual units attributed to this index
    pub virtual_total: u64,
    /// Real units outstanding, equal to the sum of every RealBalance of this index
    pub real_total: u64,
    /// Multiplier from asset precision to internal precision
    pub scaling_factor: u64,
    /// Minimum first deposit, in internal precision
    pub bootstrap_floor: u64,
    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl IndexState {
    pub const LEN: usize = 8 + // discriminator
        32 + // asset_mint
        32 + // pool_program
        32 + // pool_state
        32 + // pool_share_mint
        32 + // vault_asset_account
        32 + // vault_share_account
        8 + // virtual_total
        8 + // real_total
        8 + // scaling_factor
        8 + // bootstrap_floor
        1; // bump

    pub fn scaling_factor_for(decimals: u8) -> Result<u64> {
        require!(
            decimals <= INTERNAL_DECIMALS,
            VaultError::UnsupportedDecimals
        );
        10u64
            .checked_pow(u32::from(INTERNAL_DECIMALS - decimals))
            .ok_or_else(|| error!(VaultError::MathOverflow))
    }

    /// Asset amount expressed in internal precision
    pub fn to_internal(&self, asset_amount: u64) -> Result<u64> {
        asset_amount
            .checked_mul(self.scaling_factor)
            .ok_or_else(|| error!(VaultError::MathOverflow))
    }

    /// No real units are outstanding, so the next mint is 1:1 and must
    /// clear the bootstrap floor.
    ///
    /// Virtual units are deliberately ignored: yield harvested into an index
    /// nobody holds still leaves it in bootstrap, so the floor keeps
    /// applying until someone holds real units again.
    pub fn is_bootstrap(&self) -> bool {
        self.real_total == 0
    }
}
