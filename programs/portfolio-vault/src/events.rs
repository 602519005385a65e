use anchor_lang::prelude::*;

#[event]
pub struct ProtocolInitialized {
    pub protocol_state: Pubkey,
    pub vault_authority: Pubkey,
    pub owner: Pubkey,
}

#[event]
pub struct IndexInitialized {
    pub index: Pubkey,
    pub asset_mint: Pubkey,
    pub pool_program: Pubkey,
    pub pool_state: Pubkey,
    pub scaling_factor: u64,
    pub bootstrap_floor: u64,
}

#[event]
pub struct BalanceOpened {
    pub index: Pubkey,
    pub owner: Pubkey,
    pub sub_account: u16,
    pub balance: Pubkey,
}

#[event]
pub struct YieldHarvested {
    pub index: Pubkey,
    pub virtual_amount: u64,
    //--- ratio after the harvest
    pub virtual_total: u64,
    pub real_total: u64,
}

#[event]
pub struct Deposited {
    pub index: Pubkey,
    pub depositor: Pubkey,
    pub sub_account: u16,
    pub asset_amount: u64,
    pub virtual_amount: u64,
    pub real_amount: u64,
    pub virtual_total: u64,
    pub real_total: u64,
}

#[event]
pub struct Withdrawn {
    pub index: Pubkey,
    pub owner: Pubkey,
    pub sub_account: u16,
    pub real_amount: u64,
    pub virtual_amount: u64,
    pub asset_amount: u64,
    pub virtual_total: u64,
    pub real_total: u64,
}

#[event]
pub struct RealTransferred {
    pub index: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub real_amount: u64,
}
