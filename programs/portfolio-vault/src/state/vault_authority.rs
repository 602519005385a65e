use anchor_lang::prelude::*;

use crate::constants::VAULT_AUTHORITY_SEED;

/// Owns every custody token account and signs CPIs into external pools
#[account]
pub struct VaultAuthority {
    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl VaultAuthority {
    pub const LEN: usize = 8 + // discriminator
        1; // bump

    pub fn signer_seeds(&self) -> [&[u8]; 2] {
        [VAULT_AUTHORITY_SEED, std::slice::from_ref(&self.bump)]
    }
}
