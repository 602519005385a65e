use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke_signed;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::VAULT_AUTHORITY_SEED;
use crate::error::VaultError;
use crate::pool::{ExternalPoolState, PoolAdapter};
use crate::state::{IndexState, VaultAuthority};

/// External pool instruction tags
pub const POOL_DEPOSIT_TAG: u8 = 0x01;
pub const POOL_WITHDRAW_TAG: u8 = 0x02;
pub const POOL_CLAIM_TAG: u8 = 0x03;

/// Accounts needed to talk to the external pool bound to an index
#[derive(Accounts)]
pub struct ExternalPool<'info> {
    /// CHECK: must equal `index.pool_program`, checked in `check_binding`
    #[account(executable)]
    pub pool_program: UncheckedAccount<'info>,

    /// CHECK: owner and layout checked when the adapter connects
    #[account(mut)]
    pub pool_state: UncheckedAccount<'info>,

    /// CHECK: the pool program validates its own reserve during the CPI
    #[account(mut)]
    pub pool_asset_reserve: UncheckedAccount<'info>,

    /// The pool's share mint (virtual unit)
    #[account(mut)]
    pub pool_share_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Vault custody for the underlying asset
    #[account(
        mut,
        token::authority = vault_authority,
        token::token_program = token_program,
    )]
    pub vault_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Vault custody for pool shares
    #[account(
        mut,
        token::mint = pool_share_mint,
        token::authority = vault_authority,
        token::token_program = token_program,
    )]
    pub vault_share_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        seeds = [VAULT_AUTHORITY_SEED],
        bump = vault_authority.bump
    )]
    pub vault_authority: Account<'info, VaultAuthority>,

    pub token_program: Interface<'info, TokenInterface>,
}

impl<'info> ExternalPool<'info> {
    /// Every account must be the one recorded on the index at configuration
    pub fn check_binding(&self, index: &IndexState) -> Result<()> {
        require_keys_eq!(self.pool_program.key(), index.pool_program, VaultError::InvalidPoolState);
        require_keys_eq!(self.pool_state.key(), index.pool_state, VaultError::InvalidPoolState);
        require_keys_eq!(self.pool_share_mint.key(), index.pool_share_mint, VaultError::InvalidPoolState);
        require_keys_eq!(
            self.vault_asset_account.key(),
            index.vault_asset_account,
            VaultError::InvalidPoolState
        );
        require_keys_eq!(
            self.vault_share_account.key(),
            index.vault_share_account,
            VaultError::InvalidPoolState
        );
        Ok(())
    }

    pub fn adapter<'a>(&'a mut self, index: &IndexState) -> Result<CpiPoolAdapter<'a, 'info>> {
        self.check_binding(index)?;
        let status = ExternalPoolState::load(&self.pool_state.to_account_info(), &index.pool_program)?;
        status.check_matches(index)?;
        Ok(CpiPoolAdapter { pool: self, status })
    }
}

/// PoolAdapter backed by CPIs into the external pool program.
///
/// Results are measured as the custody balance change across the CPI alone,
/// so tokens sent to custody outside a pool call are never counted.
pub struct CpiPoolAdapter<'a, 'info> {
    pool: &'a mut ExternalPool<'info>,
    status: ExternalPoolState,
}

/// Which custody account a pool call pays into
#[derive(Clone, Copy)]
enum Custody {
    Asset,
    Share,
}

impl<'a, 'info> CpiPoolAdapter<'a, 'info> {
    fn instruction(&self, tag: u8, amount: Option<u64>) -> Instruction {
        let mut data = Vec::with_capacity(9);
        data.push(tag);
        if let Some(amount) = amount {
            data.extend_from_slice(&amount.to_le_bytes());
        }

        let accounts = vec![
            AccountMeta::new(self.pool.pool_state.key(), false),
            AccountMeta::new(self.pool.pool_asset_reserve.key(), false),
            AccountMeta::new(self.pool.pool_share_mint.key(), false),
            AccountMeta::new(self.pool.vault_asset_account.key(), false),
            AccountMeta::new(self.pool.vault_share_account.key(), false),
            AccountMeta::new_readonly(self.pool.vault_authority.key(), true),
            AccountMeta::new_readonly(self.pool.token_program.key(), false),
        ];

        Instruction {
            program_id: self.pool.pool_program.key(),
            accounts,
            data,
        }
    }

    fn custody_amount(&self, custody: Custody) -> u64 {
        match custody {
            Custody::Asset => self.pool.vault_asset_account.amount,
            Custody::Share => self.pool.vault_share_account.amount,
        }
    }

    /// Invoke the pool and return how much `custody` grew during the call
    fn invoke_measured(&mut self, tag: u8, amount: Option<u64>, custody: Custody) -> Result<u64> {
        let instruction = self.instruction(tag, amount);
        let before = self.custody_amount(custody);

        let authority_seeds = self.pool.vault_authority.signer_seeds();
        invoke_signed(
            &instruction,
            &[
                self.pool.pool_state.to_account_info(),
                self.pool.pool_asset_reserve.to_account_info(),
                self.pool.pool_share_mint.to_account_info(),
                self.pool.vault_asset_account.to_account_info(),
                self.pool.vault_share_account.to_account_info(),
                self.pool.vault_authority.to_account_info(),
                self.pool.token_program.to_account_info(),
                self.pool.pool_program.to_account_info(),
            ],
            &[&authority_seeds[..]],
        )?;

        match custody {
            Custody::Asset => self.pool.vault_asset_account.reload()?,
            Custody::Share => self.pool.vault_share_account.reload()?,
        }
        let after = self.custody_amount(custody);

        after
            .checked_sub(before)
            .ok_or_else(|| error!(VaultError::InvalidPoolState))
    }
}

impl<'a, 'info> PoolAdapter for CpiPoolAdapter<'a, 'info> {
    fn deposit(&mut self, asset_amount: u64) -> Result<u64> {
        self.invoke_measured(POOL_DEPOSIT_TAG, Some(asset_amount), Custody::Share)
    }

    fn withdraw(&mut self, virtual_amount: u64) -> Result<u64> {
        self.invoke_measured(POOL_WITHDRAW_TAG, Some(virtual_amount), Custody::Asset)
    }

    fn claim_yield(&mut self, index: &IndexState) -> Result<u64> {
        require_keys_eq!(self.pool.pool_state.key(), index.pool_state, VaultError::InvalidPoolState);
        self.invoke_measured(POOL_CLAIM_TAG, None, Custody::Share)
    }

    fn can_deposit(&self) -> bool {
        self.status.deposits_enabled
    }

    fn can_withdraw(&self) -> bool {
        self.status.withdrawals_enabled
    }
}
