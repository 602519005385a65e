use anchor_lang::prelude::*;
use anchor_spl::token_interface::{transfer_checked, Mint, TokenAccount, TransferChecked};

use crate::constants::BALANCE_SEED;
use crate::events::{Withdrawn, YieldHarvested};
use crate::operations;
use crate::pool::*;
use crate::state::{IndexState, RealBalance};

#[derive(Accounts)]
#[instruction(real_amount: u64, min_asset_out: u64, sub_account: u16)]
pub struct Withdraw<'info> {
    #[account(
        mut,
        has_one = asset_mint,
    )]
    pub index: Box<Account<'info, IndexState>>,

    /// The underlying asset mint
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    /// The owner's real balance on this index
    #[account(
        mut,
        seeds = [
            BALANCE_SEED,
            index.key().as_ref(),
            owner.key().as_ref(),
            &sub_account.to_le_bytes(),
        ],
        bump = owner_balance.bump,
        has_one = index,
        has_one = owner,
    )]
    pub owner_balance: Account<'info, RealBalance>,

    /// The owner's token account receiving the underlying asset
    #[account(
        mut,
        token::mint = asset_mint,
        token::authority = owner,
    )]
    pub owner_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub owner: Signer<'info>,

    pub pool: ExternalPool<'info>,
}

pub fn handler(
    ctx: Context<Withdraw>,
    real_amount: u64,
    min_asset_out: u64,
    sub_account: u16,
) -> Result<()> {
    let mut adapter = ctx.accounts.pool.adapter(&ctx.accounts.index)?;
    let outcome = operations::withdraw(
        &mut ctx.accounts.index,
        &mut ctx.accounts.owner_balance,
        &mut adapter,
        real_amount,
        min_asset_out,
    )?;

    // Forward what the pool returned; anything else in custody stays there
    let authority_seeds = ctx.accounts.pool.vault_authority.signer_seeds();
    let signer_seeds = &[&authority_seeds[..]];

    let transfer_accounts = TransferChecked {
        from: ctx.accounts.pool.vault_asset_account.to_account_info(),
        mint: ctx.accounts.asset_mint.to_account_info(),
        to: ctx.accounts.owner_asset_account.to_account_info(),
        authority: ctx.accounts.pool.vault_authority.to_account_info(),
    };

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.pool.token_program.to_account_info(),
        transfer_accounts,
        signer_seeds,
    );

    transfer_checked(cpi_ctx, outcome.asset_amount, ctx.accounts.asset_mint.decimals)?;

    let index = &ctx.accounts.index;
    if outcome.harvested > 0 {
        emit!(YieldHarvested {
            index: index.key(),
            virtual_amount: outcome.harvested,
            virtual_total: index.virtual_total,
            real_total: index.real_total,
        });
    }

    msg!("Withdraw successful!");
    msg!("Real units burned: {}", outcome.real_amount);
    msg!("Pool shares redeemed: {}", outcome.virtual_amount);
    msg!("Underlying returned: {}", outcome.asset_amount);
    msg!("Index virtual total: {}", index.virtual_total);
    msg!("Index real total: {}", index.real_total);

    emit!(Withdrawn {
        index: index.key(),
        owner: ctx.accounts.owner.key(),
        sub_account,
        real_amount: outcome.real_amount,
        virtual_amount: outcome.virtual_amount,
        asset_amount: outcome.asset_amount,
        virtual_total: index.virtual_total,
        real_total: index.real_total,
    });

    Ok(())
}
