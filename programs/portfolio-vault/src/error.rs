use anchor_lang::prelude::*;

// NOTE: Anchor adds 6000 to user error codes
#[error_code]
pub enum VaultError {
    #[msg("Conversion would produce zero output for a nonzero input")]
    ZeroOutput, // 6000

    #[msg("Computed output is below the caller's minimum")]
    SlippageExceeded,

    #[msg("Real balance is lower than the requested amount")]
    InsufficientBalance,

    #[msg("Index virtual total is lower than the requested amount")]
    InsufficientVirtual,

    #[msg("Deposits are disabled in the external pool")]
    DepositsPaused,

    #[msg("Withdrawals are disabled in the external pool")]
    WithdrawalsPaused,

    #[msg("First deposit into an index is below the bootstrap floor")]
    BootstrapViolation,

    #[msg("Amount must be greater than zero")]
    InvalidAmount,

    #[msg("Math operation overflow")]
    MathOverflow,

    #[msg("Index holds real units without virtual backing")]
    InvalidIndexState,

    #[msg("Index has no outstanding real units")]
    EmptyIndex,

    #[msg("Source and destination balances are the same account")]
    SelfTransfer,

    #[msg("Signer is not the protocol owner")]
    Unauthorized,

    #[msg("Bootstrap floor is below the protocol minimum")]
    InvalidBootstrapFloor,

    #[msg("Asset mint has more decimals than the internal precision")]
    UnsupportedDecimals,

    #[msg("External pool state does not match this index")]
    InvalidPoolState,
}
