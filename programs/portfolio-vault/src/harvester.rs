use anchor_lang::prelude::*;

use crate::pool::PoolAdapter;
use crate::state::IndexState;

/// Pull yield the pool reports for `index` into its virtual total.
///
/// Raises the value of every outstanding real unit uniformly and mints no
/// real units. Custody balances the pool did not report are never looked at.
/// Returns the harvested virtual amount.
pub fn harvest<P: PoolAdapter>(index: &mut IndexState, pool: &mut P) -> Result<u64> {
    let claimed = pool.claim_yield(index)?;
    if claimed == 0 {
        return Ok(0);
    }

    index.add_virtual(claimed)?;
    Ok(claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;
    use crate::test_utils::{new_balance, new_index, MockPool};

    #[test]
    fn test_nothing_pending_is_a_no_op() {
        let mut index = new_index(2_000);
        let mut pool = MockPool::default();

        assert_eq!(harvest(&mut index, &mut pool).unwrap(), 0);
        assert_eq!(index.virtual_total(), 0);
        assert_eq!(pool.claims, 1);
    }

    #[test]
    fn test_harvest_appreciates_real_units_without_minting() {
        let mut index = new_index(2_000);
        let mut alice = new_balance(0);
        index.add_virtual(2_000).unwrap();
        index.credit_real(&mut alice, 2_000).unwrap();

        let mut pool = MockPool::default();
        pool.accrue_yield(1_000);

        assert_eq!(harvest(&mut index, &mut pool).unwrap(), 1_000);
        assert_eq!(index.virtual_total(), 3_000);
        assert_eq!(index.real_total(), 2_000);
        assert_eq!(alice.virtual_value(&index.snapshot()).unwrap(), 3_000);

        // consumed: a second harvest finds nothing
        assert_eq!(harvest(&mut index, &mut pool).unwrap(), 0);
        assert_eq!(index.virtual_total(), 3_000);
    }

    #[test]
    fn test_donations_are_not_harvested() {
        let mut index = new_index(2_000);
        let mut pool = MockPool::default();
        pool.donate(10_000_000);

        assert_eq!(harvest(&mut index, &mut pool).unwrap(), 0);
        assert_eq!(index.virtual_total(), 0);
    }

    #[test]
    fn test_claim_failure_propagates() {
        let mut index = new_index(2_000);
        let mut pool = MockPool::default();
        pool.accrue_yield(5);
        pool.fail_claims = true;

        assert_eq!(
            harvest(&mut index, &mut pool).unwrap_err(),
            VaultError::InvalidPoolState.into()
        );
        assert_eq!(index.virtual_total(), 0);
    }
}
