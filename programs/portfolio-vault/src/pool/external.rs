use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::state::IndexState;

// EXTERNAL state, owned by the pool program.
// Only the leading fields are read; pools may append more after them.
#[derive(Clone, Debug, AnchorSerialize, AnchorDeserialize, PartialEq)]
pub struct ExternalPoolState {
    pub discriminator: [u8; 8],

    /// yield-bearing share token issued by the pool
    pub share_mint: Pubkey,

    pub asset_mint: Pubkey,

    pub deposits_enabled: bool,

    pub withdrawals_enabled: bool,
}

impl ExternalPoolState {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut data_slice = data;
        ExternalPoolState::deserialize(&mut data_slice).map_err(|_err| error!(VaultError::InvalidPoolState))
    }

    /// Decode `pool_state` after checking it belongs to `pool_program`
    pub fn load(pool_state: &AccountInfo, pool_program: &Pubkey) -> Result<Self> {
        require_keys_eq!(*pool_state.owner, *pool_program, VaultError::InvalidPoolState);
        let data = pool_state.try_borrow_data()?;
        Self::decode(&data)
    }

    /// The pool must trade the index's asset for the index's share mint
    pub fn check_matches(&self, index: &IndexState) -> Result<()> {
        require_keys_eq!(self.asset_mint, index.asset_mint, VaultError::InvalidPoolState);
        require_keys_eq!(self.share_mint, index.pool_share_mint, VaultError::InvalidPoolState);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::new_index;

    fn pool_state(index: &IndexState) -> ExternalPoolState {
        ExternalPoolState {
            discriminator: [7; 8],
            share_mint: index.pool_share_mint,
            asset_mint: index.asset_mint,
            deposits_enabled: false,
            withdrawals_enabled: true,
        }
    }

    #[test]
    fn test_decode_ignores_trailing_fields() {
        let index = new_index(2_000);
        let state = pool_state(&index);
        let mut data = Vec::new();
        state.serialize(&mut data).unwrap();
        data.extend_from_slice(&[0xAB; 40]);

        let decoded = ExternalPoolState::decode(&data).unwrap();
        assert_eq!(decoded, state);
        assert!(!decoded.deposits_enabled);
        assert!(decoded.withdrawals_enabled);
    }

    #[test]
    fn test_decode_short_data_fails() {
        let index = new_index(2_000);
        let mut data = Vec::new();
        pool_state(&index).serialize(&mut data).unwrap();
        assert_eq!(
            ExternalPoolState::decode(&data[..40]).unwrap_err(),
            VaultError::InvalidPoolState.into()
        );
    }

    #[test]
    fn test_mismatched_mints_are_rejected() {
        let index = new_index(2_000);
        let mut state = pool_state(&index);
        state.check_matches(&index).unwrap();

        state.share_mint = Pubkey::new_unique();
        assert!(state.check_matches(&index).is_err());
    }
}
