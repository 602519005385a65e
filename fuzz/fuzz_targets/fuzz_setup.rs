use anchor_lang::prelude::*;
use arbitrary::Arbitrary;
use portfolio_vault::conversion::mul_div_floor;
use portfolio_vault::error::VaultError;
use portfolio_vault::operations::{self, DepositOutcome, TransferOutcome, WithdrawOutcome};
use portfolio_vault::pool::PoolAdapter;
use portfolio_vault::state::{IndexState, RealBalance};

pub mod mock_pool;
pub mod program_env;

/// Number of real-unit holders in a fuzzed world
pub const ACCOUNTS: usize = 4;

// ============================================================================
// Fuzz Input
// ============================================================================

/// One user or market event
#[derive(Debug, Clone, Arbitrary)]
pub enum FuzzAction {
    Deposit {
        account: u8,
        amount: u32,
        min_real_out: u32,
    },
    Withdraw {
        account: u8,
        real_amount: u32,
        min_asset_out: u32,
    },
    Transfer {
        from: u8,
        to: u8,
        real_amount: u32,
    },
    /// Yield the pool will report on the next claim
    AccrueYield { amount: u32 },
    /// Shares sent straight to custody, never reported by the pool
    Donate { amount: u64 },
    /// Assets per share moves to num/den
    SetPrice { num: u16, den: u16 },
    ToggleDeposits,
    ToggleWithdrawals,
    /// The next pool call of any kind fails
    FailNextCall,
}

#[derive(Debug, Clone, Arbitrary)]
pub struct SequenceFuzzInput {
    pub bootstrap_floor: u16,
    pub decimals: u8,
    pub actions: Vec<FuzzAction>,
}

// ============================================================================
// In-memory Pool
// ============================================================================

/// Pool whose state can be snapshotted, so a failed operation can be rolled
/// back the way the runtime reverts a failed transaction
#[derive(Debug, Clone)]
pub struct FuzzPool {
    pub asset_per_share_num: u64,
    pub asset_per_share_den: u64,
    pub pending_yield: u64,
    /// Shares the pool's own books attribute to the vault
    pub accounted_shares: u64,
    /// Shares in custody that the pool never accounted for
    pub donated_shares: u64,
    pub deposits_enabled: bool,
    pub withdrawals_enabled: bool,
    pub fail_next_call: bool,
}

impl Default for FuzzPool {
    fn default() -> Self {
        Self {
            asset_per_share_num: 1,
            asset_per_share_den: 1,
            pending_yield: 0,
            accounted_shares: 0,
            donated_shares: 0,
            deposits_enabled: true,
            withdrawals_enabled: true,
            fail_next_call: false,
        }
    }
}

impl FuzzPool {
    fn check_call(&mut self) -> Result<()> {
        if std::mem::take(&mut self.fail_next_call) {
            return err!(VaultError::InvalidPoolState);
        }
        Ok(())
    }
}

impl PoolAdapter for FuzzPool {
    fn deposit(&mut self, asset_amount: u64) -> Result<u64> {
        self.check_call()?;
        require!(self.deposits_enabled, VaultError::DepositsPaused);
        let shares = mul_div_floor(asset_amount, self.asset_per_share_den, self.asset_per_share_num)?;
        self.accounted_shares = self
            .accounted_shares
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        Ok(shares)
    }

    fn withdraw(&mut self, virtual_amount: u64) -> Result<u64> {
        self.check_call()?;
        require!(self.withdrawals_enabled, VaultError::WithdrawalsPaused);
        self.accounted_shares = self
            .accounted_shares
            .checked_sub(virtual_amount)
            .ok_or(VaultError::InvalidPoolState)?;
        mul_div_floor(virtual_amount, self.asset_per_share_num, self.asset_per_share_den)
    }

    fn claim_yield(&mut self, _index: &IndexState) -> Result<u64> {
        self.check_call()?;
        let claimed = std::mem::take(&mut self.pending_yield);
        self.accounted_shares = self
            .accounted_shares
            .checked_add(claimed)
            .ok_or(VaultError::MathOverflow)?;
        Ok(claimed)
    }

    fn can_deposit(&self) -> bool {
        self.deposits_enabled
    }

    fn can_withdraw(&self) -> bool {
        self.withdrawals_enabled
    }
}

// ============================================================================
// World Setup
// ============================================================================

/// One index, its holders and the pool behind it
pub struct FuzzWorld {
    pub index: IndexState,
    pub balances: Vec<RealBalance>,
    pub pool: FuzzPool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WorldSnapshot {
    virtual_total: u64,
    real_total: u64,
    balances: Vec<u64>,
}

/// Two distinct holders borrowed at once
fn pair_mut(balances: &mut [RealBalance], from: usize, to: usize) -> (&mut RealBalance, &mut RealBalance) {
    if from < to {
        let (left, right) = balances.split_at_mut(to);
        (&mut left[from], &mut right[0])
    } else {
        let (left, right) = balances.split_at_mut(from);
        (&mut right[0], &mut left[to])
    }
}

/// Result of a single user action, kept for property checks
#[derive(Debug)]
pub enum ActionReport {
    Deposited(DepositOutcome),
    Withdrew(WithdrawOutcome),
    Transferred(TransferOutcome),
    Rejected(anchor_lang::error::Error),
    Market,
}

impl FuzzWorld {
    pub fn new(bootstrap_floor: u64, decimals: u8) -> Self {
        let scaling_factor = IndexState::scaling_factor_for(decimals % 10).unwrap_or(1);
        let index_key = Pubkey::new_unique();

        let index = IndexState {
            asset_mint: Pubkey::new_unique(),
            pool_program: Pubkey::new_unique(),
            pool_state: Pubkey::new_unique(),
            pool_share_mint: Pubkey::new_unique(),
            vault_asset_account: Pubkey::new_unique(),
            vault_share_account: Pubkey::new_unique(),
            virtual_total: 0,
            real_total: 0,
            scaling_factor,
            bootstrap_floor,
            bump: 255,
        };

        let balances = (0..ACCOUNTS)
            .map(|_| RealBalance {
                index: index_key,
                owner: Pubkey::new_unique(),
                sub_account: 0,
                amount: 0,
                bump: 255,
            })
            .collect();

        Self {
            index,
            balances,
            pool: FuzzPool::default(),
        }
    }

    fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            virtual_total: self.index.virtual_total,
            real_total: self.index.real_total,
            balances: self.balances.iter().map(|b| b.amount).collect(),
        }
    }

    /// Apply one action; a failed user action restores the pool as well
    pub fn apply(&mut self, action: &FuzzAction) -> ActionReport {
        let pool_before = self.pool.clone();

        let result = match *action {
            FuzzAction::Deposit {
                account,
                amount,
                min_real_out,
            } => {
                let who = account as usize % ACCOUNTS;
                operations::deposit(
                    &mut self.index,
                    &mut self.balances[who],
                    &mut self.pool,
                    amount as u64,
                    min_real_out as u64,
                )
                .map(ActionReport::Deposited)
            }
            FuzzAction::Withdraw {
                account,
                real_amount,
                min_asset_out,
            } => {
                let who = account as usize % ACCOUNTS;
                operations::withdraw(
                    &mut self.index,
                    &mut self.balances[who],
                    &mut self.pool,
                    real_amount as u64,
                    min_asset_out as u64,
                )
                .map(ActionReport::Withdrew)
            }
            FuzzAction::Transfer {
                from,
                to,
                real_amount,
            } => {
                let from = from as usize % ACCOUNTS;
                let to = to as usize % ACCOUNTS;
                if from == to {
                    return ActionReport::Market;
                }
                let (sender, receiver) = pair_mut(&mut self.balances, from, to);
                operations::transfer(
                    &mut self.index,
                    sender,
                    receiver,
                    &mut self.pool,
                    real_amount as u64,
                )
                .map(ActionReport::Transferred)
            }
            FuzzAction::AccrueYield { amount } => {
                self.pool.pending_yield = self.pool.pending_yield.saturating_add(amount as u64);
                Ok(ActionReport::Market)
            }
            FuzzAction::Donate { amount } => {
                self.pool.donated_shares = self.pool.donated_shares.saturating_add(amount);
                Ok(ActionReport::Market)
            }
            FuzzAction::SetPrice { num, den } => {
                self.pool.asset_per_share_num = (num as u64).max(1);
                self.pool.asset_per_share_den = (den as u64).max(1);
                Ok(ActionReport::Market)
            }
            FuzzAction::ToggleDeposits => {
                self.pool.deposits_enabled = !self.pool.deposits_enabled;
                Ok(ActionReport::Market)
            }
            FuzzAction::ToggleWithdrawals => {
                self.pool.withdrawals_enabled = !self.pool.withdrawals_enabled;
                Ok(ActionReport::Market)
            }
            FuzzAction::FailNextCall => {
                self.pool.fail_next_call = true;
                Ok(ActionReport::Market)
            }
        };

        match result {
            Ok(report) => report,
            Err(error) => {
                self.pool = pool_before;
                // injected faults fire once
                self.pool.fail_next_call = false;
                ActionReport::Rejected(error)
            }
        }
    }

    /// Run a whole input, checking every property after every step
    pub fn run(input: &SequenceFuzzInput) {
        let floor = (input.bootstrap_floor as u64).max(1);
        let mut world = FuzzWorld::new(floor, input.decimals);

        for action in &input.actions {
            let before = world.snapshot();
            let pending_before = world.pool.pending_yield;
            let report = world.apply(action);
            let after = world.snapshot();

            check_ledger(&world);
            check_ratio_not_diluted(&before, &after);
            check_report(&world, action, &report, &before, &after, pending_before);
        }
    }
}

// ============================================================================
// Property Checks
// ============================================================================

/// Closed ledger, backing, and donation resistance
pub fn check_ledger(world: &FuzzWorld) {
    let sum: u64 = world.balances.iter().map(|b| b.amount).sum();
    assert_eq!(
        world.index.real_total, sum,
        "CRITICAL: closed ledger violated: real_total={} sum of balances={}",
        world.index.real_total, sum
    );

    if world.index.virtual_total == 0 {
        assert_eq!(
            world.index.real_total, 0,
            "CRITICAL: {} real units outstanding with no virtual backing",
            world.index.real_total
        );
    }

    // donated shares never reach the ledger
    assert_eq!(
        world.index.virtual_total, world.pool.accounted_shares,
        "CRITICAL: virtual_total={} drifted from pool-accounted shares={} (donated={})",
        world.index.virtual_total, world.pool.accounted_shares, world.pool.donated_shares
    );
}

/// Value per real unit never decreases: v1/r1 >= v0/r0
fn check_ratio_not_diluted(before: &WorldSnapshot, after: &WorldSnapshot) {
    if before.real_total == 0 || after.real_total == 0 {
        return;
    }
    let lhs = after.virtual_total as u128 * before.real_total as u128;
    let rhs = before.virtual_total as u128 * after.real_total as u128;
    assert!(
        lhs >= rhs,
        "CRITICAL VULNERABILITY: value per real unit decreased. Before: v={} r={}, After: v={} r={}",
        before.virtual_total,
        before.real_total,
        after.virtual_total,
        after.real_total
    );
}

fn gained_accounts(before: &WorldSnapshot, after: &WorldSnapshot) -> Vec<usize> {
    (0..ACCOUNTS)
        .filter(|&i| after.balances[i] > before.balances[i])
        .collect()
}

fn check_report(
    world: &FuzzWorld,
    action: &FuzzAction,
    report: &ActionReport,
    before: &WorldSnapshot,
    after: &WorldSnapshot,
    pending_before: u64,
) {
    match (action, report) {
        (FuzzAction::Deposit { account, amount, min_real_out }, ActionReport::Deposited(outcome)) => {
            let who = *account as usize % ACCOUNTS;

            assert!(outcome.real_amount > 0, "deposit of {} minted nothing", amount);
            assert!(outcome.real_amount >= *min_real_out as u64, "slippage bound ignored");
            assert_eq!(outcome.harvested, pending_before, "deposit skipped pending yield");
            assert_eq!(after.balances[who], before.balances[who] + outcome.real_amount);
            assert_eq!(gained_accounts(before, after), vec![who], "someone besides the depositor gained");

            if before.real_total == 0 {
                assert_eq!(outcome.real_amount, outcome.virtual_amount, "bootstrap must mint 1:1");
                assert!(
                    *amount as u64 * world.index.scaling_factor >= world.index.bootstrap_floor,
                    "bootstrap floor bypassed"
                );
            } else {
                // rounding always favors existing holders
                let virtual_after_harvest = before.virtual_total + outcome.harvested;
                let exact = outcome.virtual_amount as u128 * before.real_total as u128
                    / virtual_after_harvest as u128;
                assert!(outcome.real_amount as u128 <= exact, "deposit over-minted");
            }
        }
        (FuzzAction::Withdraw { account, min_asset_out, .. }, ActionReport::Withdrew(outcome)) => {
            let who = *account as usize % ACCOUNTS;

            assert!(outcome.virtual_amount > 0 && outcome.asset_amount > 0, "withdraw paid nothing");
            assert!(outcome.asset_amount >= *min_asset_out as u64, "slippage bound ignored");
            assert_eq!(outcome.harvested, pending_before, "withdraw skipped pending yield");
            assert_eq!(after.balances[who], before.balances[who] - outcome.real_amount);
            assert!(gained_accounts(before, after).is_empty(), "withdraw credited someone");
        }
        (FuzzAction::Transfer { from, to, real_amount }, ActionReport::Transferred(outcome)) => {
            let from = *from as usize % ACCOUNTS;
            let to = *to as usize % ACCOUNTS;

            assert_eq!(outcome.real_amount, *real_amount as u64);
            assert_eq!(outcome.harvested, pending_before, "transfer skipped pending yield");
            assert_eq!(after.balances[from], before.balances[from] - outcome.real_amount);
            assert_eq!(after.balances[to], before.balances[to] + outcome.real_amount);
            assert_eq!(after.real_total, before.real_total, "transfer changed real_total");
        }
        (_, ActionReport::Rejected(error)) => {
            assert!(
                matches!(error, anchor_lang::error::Error::AnchorError(_)),
                "unexpected error kind for {:?}: {:?}",
                action,
                error
            );
            // a failed action is a no-op for the ledger
            assert_eq!(after, before, "failed action {:?} left effects: {:?}", action, error);
        }
        (_, ActionReport::Market) => {
            assert_eq!(after, before, "market event {:?} touched the ledger", action);
        }
        (action, report) => panic!("report {:?} does not match action {:?}", report, action),
    }
}

/// Convenience for targets that get raw bytes
pub fn run_bytes(data: &[u8]) {
    let mut unstructured = arbitrary::Unstructured::new(data);
    if let Ok(input) = SequenceFuzzInput::arbitrary(&mut unstructured) {
        FuzzWorld::run(&input);
    }
}
