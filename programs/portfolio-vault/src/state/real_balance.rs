use anchor_lang::prelude::*;

/// Real units held by one owner's sub-account on one index
#[account]
pub struct RealBalance {
    pub index: Pubkey,
    pub owner: Pubkey,
    pub sub_account: u16,
    pub amount: u64,
    pub bump: u8,
}

impl RealBalance {
    pub const LEN: usize = 8 + // discriminator
        32 + // index
        32 + // owner
        2 + // sub_account
        8 + // amount
        1; // bump
}
