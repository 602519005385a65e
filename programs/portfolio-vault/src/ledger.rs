use anchor_lang::prelude::*;

use crate::conversion::IndexSnapshot;
use crate::error::VaultError;
use crate::state::{IndexState, RealBalance};

/// Per-index totals and balances.
///
/// Crediting or debiting a balance moves `real_total` by the same amount, so
/// `real_total` stays equal to the sum of the index's balances after every
/// mutator. Only `operations` and `harvester` call the mutators.
impl IndexState {
    pub fn virtual_total(&self) -> u64 {
        self.virtual_total
    }

    pub fn real_total(&self) -> u64 {
        self.real_total
    }

    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot::from(self)
    }

    pub(crate) fn credit_real(&mut self, balance: &mut RealBalance, amount: u64) -> Result<()> {
        let real_total = self
            .real_total
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        let new_amount = balance
            .amount
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;

        self.real_total = real_total;
        balance.amount = new_amount;
        Ok(())
    }

    pub(crate) fn debit_real(&mut self, balance: &mut RealBalance, amount: u64) -> Result<()> {
        require_gte!(balance.amount, amount, VaultError::InsufficientBalance);
        // a balance never exceeds the total it is part of
        require_gte!(self.real_total, amount, VaultError::InvalidIndexState);

        balance.amount -= amount;
        self.real_total -= amount;
        Ok(())
    }

    pub(crate) fn add_virtual(&mut self, amount: u64) -> Result<()> {
        self.virtual_total = self
            .virtual_total
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    pub(crate) fn remove_virtual(&mut self, amount: u64) -> Result<()> {
        require_gte!(self.virtual_total, amount, VaultError::InsufficientVirtual);
        self.virtual_total -= amount;
        Ok(())
    }
}

impl RealBalance {
    pub fn balance_of(&self) -> u64 {
        self.amount
    }

    /// Virtual units this balance would redeem for against `snapshot`
    pub fn virtual_value(&self, snapshot: &IndexSnapshot) -> Result<u64> {
        if self.amount == 0 {
            return Ok(0);
        }
        snapshot.real_to_virtual(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{new_balance, new_index};

    #[test]
    fn test_credit_and_debit_keep_ledger_closed() {
        let mut index = new_index(2_000);
        let mut alice = new_balance(0);
        let mut bob = new_balance(1);

        index.credit_real(&mut alice, 700).unwrap();
        index.credit_real(&mut bob, 300).unwrap();
        assert_eq!(index.real_total(), 1_000);

        index.debit_real(&mut alice, 200).unwrap();
        assert_eq!(alice.balance_of(), 500);
        assert_eq!(index.real_total(), alice.amount + bob.amount);
    }

    #[test]
    fn test_debit_beyond_balance_fails_without_effect() {
        let mut index = new_index(2_000);
        let mut alice = new_balance(0);
        index.credit_real(&mut alice, 50).unwrap();

        assert_eq!(
            index.debit_real(&mut alice, 51).unwrap_err(),
            VaultError::InsufficientBalance.into()
        );
        assert_eq!(alice.amount, 50);
        assert_eq!(index.real_total(), 50);
    }

    #[test]
    fn test_remove_virtual_beyond_total_fails() {
        let mut index = new_index(2_000);
        index.add_virtual(10).unwrap();

        assert_eq!(
            index.remove_virtual(11).unwrap_err(),
            VaultError::InsufficientVirtual.into()
        );
        index.remove_virtual(10).unwrap();
        assert_eq!(index.virtual_total(), 0);
    }

    #[test]
    fn test_credit_overflow_is_reported() {
        let mut index = new_index(2_000);
        let mut alice = new_balance(0);
        index.credit_real(&mut alice, u64::MAX).unwrap();

        let mut bob = new_balance(1);
        assert_eq!(
            index.credit_real(&mut bob, 1).unwrap_err(),
            VaultError::MathOverflow.into()
        );
        assert_eq!(bob.amount, 0);
    }

    #[test]
    fn test_virtual_value_follows_ratio() {
        let mut index = new_index(2_000);
        let mut alice = new_balance(0);
        index.add_virtual(3_000).unwrap();
        index.credit_real(&mut alice, 2_000).unwrap();

        assert_eq!(alice.virtual_value(&index.snapshot()).unwrap(), 3_000);
        assert_eq!(new_balance(1).virtual_value(&index.snapshot()).unwrap(), 0);
    }
}
