//! Boundary to the external yield pools.
//!
//! The pool's pricing is opaque: the vault only sees how many virtual units
//! a deposit produced and how many assets a withdrawal returned.

pub mod adapter;
pub mod external;

pub use adapter::*;
pub use external::*;

use anchor_lang::prelude::*;

use crate::state::IndexState;

pub trait PoolAdapter {
    /// Submit assets, returning the virtual units received
    fn deposit(&mut self, asset_amount: u64) -> Result<u64>;

    /// Redeem virtual units, returning the assets received
    fn withdraw(&mut self, virtual_amount: u64) -> Result<u64>;

    /// Virtual units accrued for `index` since its last claim.
    ///
    /// Implementations must only report what the pool's own yield accounting
    /// produced, never balances that happen to sit in vault custody.
    fn claim_yield(&mut self, index: &IndexState) -> Result<u64>;

    fn can_deposit(&self) -> bool;

    fn can_withdraw(&self) -> bool;
}
