pub mod constants;
pub mod conversion;
pub mod error;
pub mod events;
pub mod harvester;
pub mod instructions;
pub mod ledger;
pub mod operations;
pub mod pool;
pub mod state;

#[cfg(test)]
mod test_utils;

use anchor_lang::prelude::*;

pub use constants::*;
pub use instructions::*;
pub use pool::*;
pub use state::*;

declare_id!("8qsydpwMiRcFtJ8wrKkM4xrMMEWfnw2szibQGLgBw6KH");

#[program]
pub mod portfolio_vault {
    use super::*;

    pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
        initialize::handler(ctx)
    }

    pub fn initialize_index(ctx: Context<InitializeIndex>, bootstrap_floor: u64) -> Result<()> {
        initialize_index::handler(ctx, bootstrap_floor)
    }

    pub fn open_balance(ctx: Context<OpenBalance>, sub_account: u16) -> Result<()> {
        open_balance::handler(ctx, sub_account)
    }

    pub fn deposit(
        ctx: Context<Deposit>,
        amount: u64,
        min_real_out: u64,
        sub_account: u16,
    ) -> Result<()> {
        deposit::handler(ctx, amount, min_real_out, sub_account)
    }

    pub fn withdraw(
        ctx: Context<Withdraw>,
        real_amount: u64,
        min_asset_out: u64,
        sub_account: u16,
    ) -> Result<()> {
        withdraw::handler(ctx, real_amount, min_asset_out, sub_account)
    }

    pub fn transfer(ctx: Context<Transfer>, real_amount: u64, from_sub_account: u16) -> Result<()> {
        transfer::handler(ctx, real_amount, from_sub_account)
    }

    pub fn sub_transfer(
        ctx: Context<SubTransfer>,
        from_sub_account: u16,
        to_sub_account: u16,
        real_amount: u64,
    ) -> Result<()> {
        sub_transfer::handler(ctx, from_sub_account, to_sub_account, real_amount)
    }
}
