use anchor_lang::prelude::*;
use anchor_spl::token_interface::{transfer_checked, Mint, TokenAccount, TransferChecked};

use crate::constants::BALANCE_SEED;
use crate::events::{Deposited, YieldHarvested};
use crate::operations;
use crate::pool::*;
use crate::state::{IndexState, RealBalance};

#[derive(Accounts)]
#[instruction(amount: u64, min_real_out: u64, sub_account: u16)]
pub struct Deposit<'info> {
    #[account(
        mut,
        has_one = asset_mint,
    )]
    pub index: Box<Account<'info, IndexState>>,

    /// The underlying asset mint
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    /// The depositor's real balance on this index
    #[account(
        mut,
        seeds = [
            BALANCE_SEED,
            index.key().as_ref(),
            depositor.key().as_ref(),
            &sub_account.to_le_bytes(),
        ],
        bump = depositor_balance.bump,
        has_one = index,
    )]
    pub depositor_balance: Account<'info, RealBalance>,

    /// The depositor's token account for the underlying asset
    #[account(
        mut,
        token::mint = asset_mint,
        token::authority = depositor,
    )]
    pub depositor_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub depositor: Signer<'info>,

    pub pool: ExternalPool<'info>,
}

pub fn handler(
    ctx: Context<Deposit>,
    amount: u64,
    min_real_out: u64,
    sub_account: u16,
) -> Result<()> {
    // Move the assets into custody; the pool pulls exactly `amount` from there
    let transfer_accounts = TransferChecked {
        from: ctx.accounts.depositor_asset_account.to_account_info(),
        mint: ctx.accounts.asset_mint.to_account_info(),
        to: ctx.accounts.pool.vault_asset_account.to_account_info(),
        authority: ctx.accounts.depositor.to_account_info(),
    };

    let cpi_ctx = CpiContext::new(
        ctx.accounts.pool.token_program.to_account_info(),
        transfer_accounts,
    );

    transfer_checked(cpi_ctx, amount, ctx.accounts.asset_mint.decimals)?;

    let mut adapter = ctx.accounts.pool.adapter(&ctx.accounts.index)?;
    let outcome = operations::deposit(
        &mut ctx.accounts.index,
        &mut ctx.accounts.depositor_balance,
        &mut adapter,
        amount,
        min_real_out,
    )?;

    let index = &ctx.accounts.index;
    if outcome.harvested > 0 {
        emit!(YieldHarvested {
            index: index.key(),
            virtual_amount: outcome.harvested,
            virtual_total: index.virtual_total,
            real_total: index.real_total,
        });
    }

    msg!("Deposit successful!");
    msg!("Deposited: {} tokens", amount);
    msg!("Pool shares received: {}", outcome.virtual_amount);
    msg!("Minted: {} real units", outcome.real_amount);
    msg!("Index virtual total: {}", index.virtual_total);
    msg!("Index real total: {}", index.real_total);

    emit!(Deposited {
        index: index.key(),
        depositor: ctx.accounts.depositor.key(),
        sub_account,
        asset_amount: amount,
        virtual_amount: outcome.virtual_amount,
        real_amount: outcome.real_amount,
        virtual_total: index.virtual_total,
        real_total: index.real_total,
    });

    Ok(())
}
