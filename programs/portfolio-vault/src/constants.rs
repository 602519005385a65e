use anchor_lang::prelude::*;

#[constant]
pub const PROTOCOL_STATE_SEED: &[u8] = b"protocol_state";

#[constant]
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

#[constant]
pub const INDEX_SEED: &[u8] = b"index";

#[constant]
pub const BALANCE_SEED: &[u8] = b"balance";

pub const VAULT_ASSET_SEED: &[u8] = b"vault_asset";

pub const VAULT_SHARE_SEED: &[u8] = b"vault_share";

/// Decimal precision every index is normalized to before policy checks
pub const INTERNAL_DECIMALS: u8 = 9;

/// Lowest bootstrap floor an index may be configured with, in internal units
pub const MIN_BOOTSTRAP_FLOOR: u64 = 1_000;
