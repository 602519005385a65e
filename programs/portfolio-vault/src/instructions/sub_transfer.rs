use anchor_lang::prelude::*;

use crate::constants::BALANCE_SEED;
use crate::error::VaultError;
use crate::events::{RealTransferred, YieldHarvested};
use crate::operations;
use crate::pool::*;
use crate::state::{IndexState, RealBalance};

#[derive(Accounts)]
#[instruction(from_sub_account: u16, to_sub_account: u16)]
pub struct SubTransfer<'info> {
    #[account(mut)]
    pub index: Box<Account<'info, IndexState>>,

    #[account(
        mut,
        seeds = [
            BALANCE_SEED,
            index.key().as_ref(),
            owner.key().as_ref(),
            &from_sub_account.to_le_bytes(),
        ],
        bump = from_balance.bump,
        has_one = index,
        has_one = owner,
    )]
    pub from_balance: Account<'info, RealBalance>,

    #[account(
        mut,
        seeds = [
            BALANCE_SEED,
            index.key().as_ref(),
            owner.key().as_ref(),
            &to_sub_account.to_le_bytes(),
        ],
        bump = to_balance.bump,
        has_one = index,
        has_one = owner,
        constraint = to_balance.key() != from_balance.key() @ VaultError::SelfTransfer,
    )]
    pub to_balance: Account<'info, RealBalance>,

    pub owner: Signer<'info>,

    pub pool: ExternalPool<'info>,
}

pub fn handler(
    ctx: Context<SubTransfer>,
    from_sub_account: u16,
    to_sub_account: u16,
    real_amount: u64,
) -> Result<()> {
    let mut adapter = ctx.accounts.pool.adapter(&ctx.accounts.index)?;
    let outcome = operations::sub_transfer(
        &mut ctx.accounts.index,
        &mut ctx.accounts.from_balance,
        &mut ctx.accounts.to_balance,
        &mut adapter,
        real_amount,
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

    msg!(
        "Moved {} real units from sub-account {} to {}",
        outcome.real_amount,
        from_sub_account,
        to_sub_account
    );

    emit!(RealTransferred {
        index: index.key(),
        from: ctx.accounts.from_balance.key(),
        to: ctx.accounts.to_balance.key(),
        real_amount: outcome.real_amount,
    });

    Ok(())
}
