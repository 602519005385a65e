use anchor_lang::prelude::*;

use crate::conversion::mul_div_floor;
use crate::error::VaultError;
use crate::pool::PoolAdapter;
use crate::state::{IndexState, RealBalance};

pub fn new_index(bootstrap_floor: u64) -> IndexState {
    IndexState {
        asset_mint: Pubkey::new_unique(),
        pool_program: Pubkey::new_unique(),
        pool_state: Pubkey::new_unique(),
        pool_share_mint: Pubkey::new_unique(),
        vault_asset_account: Pubkey::new_unique(),
        vault_share_account: Pubkey::new_unique(),
        virtual_total: 0,
        real_total: 0,
        scaling_factor: 1,
        bootstrap_floor,
        bump: 255,
    }
}

pub fn new_balance(sub_account: u16) -> RealBalance {
    RealBalance {
        index: Pubkey::new_unique(),
        owner: Pubkey::new_unique(),
        sub_account,
        amount: 0,
        bump: 255,
    }
}

/// In-memory pool priced at `asset_per_share_num / asset_per_share_den`
pub struct MockPool {
    pub asset_per_share_num: u64,
    pub asset_per_share_den: u64,
    pub pending_yield: u64,
    /// shares sitting in vault custody that the pool never accounted for
    pub donated: u64,
    pub deposits_enabled: bool,
    pub withdrawals_enabled: bool,
    pub fail_claims: bool,
    pub fail_withdrawals: bool,
    pub claims: u32,
    pub deposits: u32,
    pub withdrawals: u32,
}

impl Default for MockPool {
    fn default() -> Self {
        Self {
            asset_per_share_num: 1,
            asset_per_share_den: 1,
            pending_yield: 0,
            donated: 0,
            deposits_enabled: true,
            withdrawals_enabled: true,
            fail_claims: false,
            fail_withdrawals: false,
            claims: 0,
            deposits: 0,
            withdrawals: 0,
        }
    }
}

impl MockPool {
    pub fn accrue_yield(&mut self, virtual_amount: u64) {
        self.pending_yield += virtual_amount;
    }

    pub fn donate(&mut self, virtual_amount: u64) {
        self.donated += virtual_amount;
    }

    pub fn set_price(&mut self, num: u64, den: u64) {
        self.asset_per_share_num = num;
        self.asset_per_share_den = den;
    }
}

impl PoolAdapter for MockPool {
    fn deposit(&mut self, asset_amount: u64) -> Result<u64> {
        require!(self.deposits_enabled, VaultError::DepositsPaused);
        self.deposits += 1;
        mul_div_floor(asset_amount, self.asset_per_share_den, self.asset_per_share_num)
    }

    fn withdraw(&mut self, virtual_amount: u64) -> Result<u64> {
        require!(!self.fail_withdrawals, VaultError::InvalidPoolState);
        require!(self.withdrawals_enabled, VaultError::WithdrawalsPaused);
        self.withdrawals += 1;
        mul_div_floor(virtual_amount, self.asset_per_share_num, self.asset_per_share_den)
    }

    fn claim_yield(&mut self, _index: &IndexState) -> Result<u64> {
        require!(!self.fail_claims, VaultError::InvalidPoolState);
        self.claims += 1;
        Ok(std::mem::take(&mut self.pending_yield))
    }

    fn can_deposit(&self) -> bool {
        self.deposits_enabled
    }

    fn can_withdraw(&self) -> bool {
        self.withdrawals_enabled
    }
}
