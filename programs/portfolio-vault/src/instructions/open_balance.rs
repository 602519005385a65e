use anchor_lang::prelude::*;

use crate::constants::BALANCE_SEED;
use crate::events::BalanceOpened;
use crate::state::{IndexState, RealBalance};

#[derive(Accounts)]
#[instruction(sub_account: u16)]
pub struct OpenBalance<'info> {
    pub index: Account<'info, IndexState>,

    #[account(
        init,
        payer = payer,
        space = RealBalance::LEN,
        seeds = [
            BALANCE_SEED,
            index.key().as_ref(),
            owner.key().as_ref(),
            &sub_account.to_le_bytes(),
        ],
        bump
    )]
    pub balance: Account<'info, RealBalance>,

    /// CHECK: any key may hold real units; it signs only to spend them
    pub owner: UncheckedAccount<'info>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<OpenBalance>, sub_account: u16) -> Result<()> {
    let balance = &mut ctx.accounts.balance;
    balance.index = ctx.accounts.index.key();
    balance.owner = ctx.accounts.owner.key();
    balance.sub_account = sub_account;
    balance.amount = 0;
    balance.bump = ctx.bumps.balance;

    emit!(BalanceOpened {
        index: balance.index,
        owner: balance.owner,
        sub_account,
        balance: balance.key(),
    });

    Ok(())
}
