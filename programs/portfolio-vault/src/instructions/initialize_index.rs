use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::*;
use crate::error::VaultError;
use crate::events::IndexInitialized;
use crate::pool::ExternalPoolState;
use crate::state::{IndexState, ProtocolState, VaultAuthority};

#[derive(Accounts)]
pub struct InitializeIndex<'info> {
    #[account(
        seeds = [PROTOCOL_STATE_SEED],
        bump = protocol_state.bump,
    )]
    pub protocol_state: Account<'info, ProtocolState>,

    #[account(
        init,
        payer = payer,
        space = IndexState::LEN,
        seeds = [INDEX_SEED, asset_mint.key().as_ref(), pool_state.key().as_ref()],
        bump
    )]
    pub index: Account<'info, IndexState>,

    /// The underlying asset deposited into the pool
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    /// CHECK: recorded on the index; every later CPI targets it
    #[account(executable)]
    pub pool_program: UncheckedAccount<'info>,

    /// CHECK: owner and layout checked in the handler
    pub pool_state: UncheckedAccount<'info>,

    /// The pool's share mint (virtual unit)
    pub pool_share_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Vault custody for the asset
    #[account(
        init,
        payer = payer,
        token::mint = asset_mint,
        token::authority = vault_authority,
        token::token_program = token_program,
        seeds = [VAULT_ASSET_SEED, index.key().as_ref()],
        bump
    )]
    pub vault_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Vault custody for pool shares
    #[account(
        init,
        payer = payer,
        token::mint = pool_share_mint,
        token::authority = vault_authority,
        token::token_program = token_program,
        seeds = [VAULT_SHARE_SEED, index.key().as_ref()],
        bump
    )]
    pub vault_share_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        seeds = [VAULT_AUTHORITY_SEED],
        bump = vault_authority.bump
    )]
    pub vault_authority: Account<'info, VaultAuthority>,

    pub owner: Signer<'info>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(ctx: Context<InitializeIndex>, bootstrap_floor: u64) -> Result<()> {
    require!(
        ctx.accounts.protocol_state.is_owner(&ctx.accounts.owner.key()),
        VaultError::Unauthorized
    );
    require_gte!(
        bootstrap_floor,
        MIN_BOOTSTRAP_FLOOR,
        VaultError::InvalidBootstrapFloor
    );
    let scaling_factor = IndexState::scaling_factor_for(ctx.accounts.asset_mint.decimals)?;

    let index = &mut ctx.accounts.index;
    index.asset_mint = ctx.accounts.asset_mint.key();
    index.pool_program = ctx.accounts.pool_program.key();
    index.pool_state = ctx.accounts.pool_state.key();
    index.pool_share_mint = ctx.accounts.pool_share_mint.key();
    index.vault_asset_account = ctx.accounts.vault_asset_account.key();
    index.vault_share_account = ctx.accounts.vault_share_account.key();
    index.virtual_total = 0;
    index.real_total = 0;
    index.scaling_factor = scaling_factor;
    index.bootstrap_floor = bootstrap_floor;
    index.bump = ctx.bumps.index;

    let pool_state = ExternalPoolState::load(
        &ctx.accounts.pool_state.to_account_info(),
        &index.pool_program,
    )?;
    pool_state.check_matches(index)?;

    msg!("Index initialized");
    msg!("Index: {}", index.key());
    msg!("Asset Mint: {}", index.asset_mint);
    msg!("Pool State: {}", index.pool_state);
    msg!("Scaling Factor: {}", scaling_factor);
    msg!("Bootstrap Floor: {}", bootstrap_floor);

    emit!(IndexInitialized {
        index: index.key(),
        asset_mint: index.asset_mint,
        pool_program: index.pool_program,
        pool_state: index.pool_state,
        scaling_factor,
        bootstrap_floor,
    });

    Ok(())
}
