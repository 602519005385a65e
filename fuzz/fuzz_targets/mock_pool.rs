//! Native yield pool loaded into the test bank next to the vault program.
//!
//! Shares are priced 1:1 against the asset. Yield is booked with `accrue`
//! and paid out as freshly minted shares on the next `claim`. `airdrop`
//! mints shares anywhere without booking them, which is how tests donate
//! to vault custody.

use anchor_lang::solana_program::account_info::AccountInfo;
use anchor_lang::solana_program::entrypoint::ProgramResult;
use anchor_lang::solana_program::program::{invoke, invoke_signed};
use anchor_lang::solana_program::program_error::ProgramError;
use anchor_lang::solana_program::pubkey::Pubkey;
use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use portfolio_vault::pool::{ExternalPoolState, POOL_CLAIM_TAG, POOL_DEPOSIT_TAG, POOL_WITHDRAW_TAG};
use spl_token::instruction as token_instruction;

pub const MOCK_POOL_SEED: &[u8] = b"mock_pool";

/// Test-only instructions
pub const ACCRUE_TAG: u8 = 0x10;
pub const SET_FLAGS_TAG: u8 = 0x11;
pub const AIRDROP_TAG: u8 = 0x12;

/// Custom error returned while deposits or withdrawals are switched off
pub const POOL_PAUSED: u32 = 1;

/// Pool state account layout: the header the vault decodes, then our books
#[derive(Clone, Debug, AnchorSerialize, AnchorDeserialize, PartialEq)]
pub struct MockPoolState {
    pub header: ExternalPoolState,
    pub pending_yield: u64,
}

impl MockPoolState {
    pub const LEN: usize = 8 + 32 + 32 + 1 + 1 + 8;

    pub fn new(asset_mint: Pubkey, share_mint: Pubkey) -> Self {
        Self {
            header: ExternalPoolState {
                discriminator: *b"mockpool",
                share_mint,
                asset_mint,
                deposits_enabled: true,
                withdrawals_enabled: true,
            },
            pending_yield: 0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::LEN);
        // writing into a Vec cannot fail
        let _ = self.serialize(&mut data);
        data
    }

    fn load(account: &AccountInfo) -> Result<Self, ProgramError> {
        let data = account.try_borrow_data()?;
        let mut slice: &[u8] = &data;
        Self::deserialize(&mut slice).map_err(|_| ProgramError::InvalidAccountData)
    }

    fn store(&self, account: &AccountInfo) -> ProgramResult {
        let mut data = account.try_borrow_mut_data()?;
        let mut slice: &mut [u8] = &mut data;
        self.serialize(&mut slice)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }
}

pub fn derive_pool_state_pda(pool_program: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[MOCK_POOL_SEED], pool_program)
}

fn read_u64(data: &[u8]) -> Result<u64, ProgramError> {
    data.get(..8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)
}

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let (&tag, rest) = data
        .split_first()
        .ok_or(ProgramError::InvalidInstructionData)?;
    let pool_state = accounts.first().ok_or(ProgramError::NotEnoughAccountKeys)?;

    let (expected, bump) = derive_pool_state_pda(program_id);
    if *pool_state.key != expected || pool_state.owner != program_id {
        return Err(ProgramError::InvalidSeeds);
    }
    let signer_seeds: &[&[u8]] = &[MOCK_POOL_SEED, &[bump]];
    let mut state = MockPoolState::load(pool_state)?;

    match tag {
        POOL_DEPOSIT_TAG => {
            let [_, reserve, share_mint, vault_asset, vault_share, vault_authority, token_program] =
                accounts
            else {
                return Err(ProgramError::NotEnoughAccountKeys);
            };
            if !state.header.deposits_enabled {
                return Err(ProgramError::Custom(POOL_PAUSED));
            }
            let amount = read_u64(rest)?;

            // vault authority signed the outer call
            invoke(
                &token_instruction::transfer(
                    token_program.key,
                    vault_asset.key,
                    reserve.key,
                    vault_authority.key,
                    &[],
                    amount,
                )?,
                &[
                    vault_asset.clone(),
                    reserve.clone(),
                    vault_authority.clone(),
                    token_program.clone(),
                ],
            )?;
            invoke_signed(
                &token_instruction::mint_to(
                    token_program.key,
                    share_mint.key,
                    vault_share.key,
                    pool_state.key,
                    &[],
                    amount,
                )?,
                &[
                    share_mint.clone(),
                    vault_share.clone(),
                    pool_state.clone(),
                    token_program.clone(),
                ],
                &[signer_seeds],
            )?;
        }
        POOL_WITHDRAW_TAG => {
            let [_, reserve, share_mint, vault_asset, vault_share, vault_authority, token_program] =
                accounts
            else {
                return Err(ProgramError::NotEnoughAccountKeys);
            };
            if !state.header.withdrawals_enabled {
                return Err(ProgramError::Custom(POOL_PAUSED));
            }
            let amount = read_u64(rest)?;

            invoke(
                &token_instruction::burn(
                    token_program.key,
                    vault_share.key,
                    share_mint.key,
                    vault_authority.key,
                    &[],
                    amount,
                )?,
                &[
                    vault_share.clone(),
                    share_mint.clone(),
                    vault_authority.clone(),
                    token_program.clone(),
                ],
            )?;
            invoke_signed(
                &token_instruction::transfer(
                    token_program.key,
                    reserve.key,
                    vault_asset.key,
                    pool_state.key,
                    &[],
                    amount,
                )?,
                &[
                    reserve.clone(),
                    vault_asset.clone(),
                    pool_state.clone(),
                    token_program.clone(),
                ],
                &[signer_seeds],
            )?;
        }
        POOL_CLAIM_TAG => {
            let [_, _, share_mint, _, vault_share, _, token_program] = accounts else {
                return Err(ProgramError::NotEnoughAccountKeys);
            };
            let claimed = std::mem::take(&mut state.pending_yield);
            if claimed > 0 {
                invoke_signed(
                    &token_instruction::mint_to(
                        token_program.key,
                        share_mint.key,
                        vault_share.key,
                        pool_state.key,
                        &[],
                        claimed,
                    )?,
                    &[
                        share_mint.clone(),
                        vault_share.clone(),
                        pool_state.clone(),
                        token_program.clone(),
                    ],
                    &[signer_seeds],
                )?;
            }
            state.store(pool_state)?;
        }
        ACCRUE_TAG => {
            state.pending_yield = state
                .pending_yield
                .checked_add(read_u64(rest)?)
                .ok_or(ProgramError::ArithmeticOverflow)?;
            state.store(pool_state)?;
        }
        SET_FLAGS_TAG => {
            let flags = rest.get(..2).ok_or(ProgramError::InvalidInstructionData)?;
            state.header.deposits_enabled = flags[0] != 0;
            state.header.withdrawals_enabled = flags[1] != 0;
            state.store(pool_state)?;
        }
        AIRDROP_TAG => {
            let [_, share_mint, destination, token_program] = accounts else {
                return Err(ProgramError::NotEnoughAccountKeys);
            };
            invoke_signed(
                &token_instruction::mint_to(
                    token_program.key,
                    share_mint.key,
                    destination.key,
                    pool_state.key,
                    &[],
                    read_u64(rest)?,
                )?,
                &[
                    share_mint.clone(),
                    destination.clone(),
                    pool_state.clone(),
                    token_program.clone(),
                ],
                &[signer_seeds],
            )?;
        }
        _ => return Err(ProgramError::InvalidInstructionData),
    }

    Ok(())
}
