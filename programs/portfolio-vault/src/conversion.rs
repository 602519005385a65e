//! Conversion between virtual units (pool shares) and real units (vault claims).
//!
//! Every division floors, so a conversion can only under-credit the caller
//! relative to exact math. A nonzero input that floors to zero is an error,
//! never a silent zero.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::state::IndexState;

/// Totals of an index taken after harvesting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexSnapshot {
    pub virtual_total: u64,
    pub real_total: u64,
}

impl From<&IndexState> for IndexSnapshot {
    fn from(index: &IndexState) -> Self {
        Self {
            virtual_total: index.virtual_total,
            real_total: index.real_total,
        }
    }
}

/// floor(amount * numerator / denominator), computed in u128
pub fn mul_div_floor(amount: u64, numerator: u64, denominator: u64) -> Result<u64> {
    let value = (amount as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?
        .checked_div(denominator as u128)
        .ok_or(VaultError::MathOverflow)?;
    u64::try_from(value).map_err(|_| error!(VaultError::MathOverflow))
}

impl IndexSnapshot {
    /// Real units to mint for `virtual_amount` newly attributed virtual units.
    ///
    /// An index without outstanding real units mints 1:1.
    pub fn virtual_to_real(&self, virtual_amount: u64) -> Result<u64> {
        if self.real_total == 0 {
            return Ok(virtual_amount);
        }
        require!(self.virtual_total > 0, VaultError::InvalidIndexState);

        let real_amount = mul_div_floor(virtual_amount, self.real_total, self.virtual_total)?;
        if virtual_amount > 0 && real_amount == 0 {
            return err!(VaultError::ZeroOutput);
        }
        Ok(real_amount)
    }

    /// Virtual units released when `real_amount` real units are burned
    pub fn real_to_virtual(&self, real_amount: u64) -> Result<u64> {
        require!(self.real_total > 0, VaultError::EmptyIndex);

        let virtual_amount = mul_div_floor(real_amount, self.virtual_total, self.real_total)?;
        if real_amount > 0 && virtual_amount == 0 {
            return err!(VaultError::ZeroOutput);
        }
        Ok(virtual_amount)
    }
}
