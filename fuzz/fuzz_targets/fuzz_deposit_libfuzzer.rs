#![no_main]

use arbitrary::Arbitrary;
use fuzz_helpers::program_env::*;
use libfuzzer_sys::fuzz_target;
use portfolio_vault::error::VaultError;

// covers any u32 deposit twice over
const USER_BALANCE: u64 = 2 * u32::MAX as u64;

/// Bootstrap deposit, donation and yield, then a second deposit, all on the bank
#[derive(Debug, Clone, Arbitrary)]
struct DepositFuzzInput {
    first_deposit: u32,
    /// Shares minted straight into vault custody
    donation: u32,
    /// Yield the pool reports on the next claim
    yield_amount: u32,
    second_deposit: u32,
    min_real_out: u32,
    bootstrap_floor: u16,
}

/// Rejections a well-behaved vault may return for arbitrary amounts
fn is_acceptable(err: &BanksClientError) -> bool {
    let acceptable = [
        VaultError::BootstrapViolation,
        VaultError::InvalidAmount,
        VaultError::ZeroOutput,
        VaultError::SlippageExceeded,
    ];
    custom_error_code(err)
        .map(|code| acceptable.iter().any(|e| u32::from(*e) == code))
        .unwrap_or(false)
}

async fn fuzz_deposit_once(input: DepositFuzzInput) -> FuzzResult<()> {
    let floor = (input.bootstrap_floor as u64).max(portfolio_vault::MIN_BOOTSTRAP_FLOOR);
    let (mut env, _protocol, index) = setup_complete_environment(9, floor).await?;
    let alice = setup_user(&mut env, &index, USER_BALANCE).await?;
    let bob = setup_user(&mut env, &index, USER_BALANCE).await?;

    let ix = deposit_ix(&env, &index, &alice, input.first_deposit as u64, 0);
    match send(&mut env.context, &[ix], &[&alice.owner]).await {
        Ok(()) => {
            assert!(input.first_deposit as u64 >= floor, "bootstrap floor bypassed");
        }
        Err(e) if is_acceptable(&e) => return Ok(()),
        Err(e) => panic!("Unexpected error on first deposit: {:?}\nInput: {:?}", e, input),
    }

    let first = get_index_state(&mut env.context, &index.index).await?;
    assert_eq!(first.virtual_total, input.first_deposit as u64);
    assert_eq!(first.real_total, input.first_deposit as u64, "bootstrap must mint 1:1");

    if input.donation > 0 {
        donate_shares(&mut env, &index.vault_share_account, input.donation as u64).await?;
    }
    if input.yield_amount > 0 {
        accrue_yield(&mut env, input.yield_amount as u64).await?;
    }

    let ix = deposit_ix(&env, &index, &bob, input.second_deposit as u64, input.min_real_out as u64);
    let result = send(&mut env.context, &[ix], &[&bob.owner]).await;
    let after = get_index_state(&mut env.context, &index.index).await?;
    let alice_real = get_real_balance(&mut env.context, &alice.balance).await?;
    let bob_real = get_real_balance(&mut env.context, &bob.balance).await?;

    // CRITICAL: closed ledger
    assert_eq!(after.real_total, alice_real + bob_real, "closed ledger violated");

    match result {
        Ok(()) => {
            let harvested_total = first.virtual_total + input.yield_amount as u64;

            // CRITICAL: donations never reach virtual_total
            assert_eq!(
                after.virtual_total,
                harvested_total + input.second_deposit as u64,
                "virtual_total counted unreported custody balance (donation={})",
                input.donation
            );

            assert!(bob_real > 0, "deposit of {} minted nothing", input.second_deposit);
            assert!(bob_real >= input.min_real_out as u64, "slippage bound ignored");

            // rounding favors existing holders
            let fair = input.second_deposit as u128 * first.real_total as u128 / harvested_total as u128;
            assert!(bob_real as u128 <= fair, "deposit over-minted: {} > {}", bob_real, fair);
        }
        Err(e) if is_acceptable(&e) => {
            assert_eq!(bob_real, 0);
            assert_eq!(after.real_total, first.real_total, "failed deposit left effects");
        }
        Err(e) => panic!("Unexpected error on second deposit: {:?}\nInput: {:?}", e, input),
    }

    Ok(())
}

fuzz_target!(|input: DepositFuzzInput| {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        if let Err(e) = fuzz_deposit_once(input).await {
            panic!("Fuzz iteration failed: {}", e);
        }
    });
});
