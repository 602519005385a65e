use anchor_lang::prelude::AccountInfo;
use anchor_lang::solana_program::entrypoint::ProgramResult;
use anchor_lang::AccountDeserialize;
use anchor_lang::InstructionData;
use anchor_lang::ToAccountMetas;
use portfolio_vault::state::{IndexState, ProtocolState, RealBalance};
use solana_program_test::*;
use solana_sdk::{
    account::Account,
    instruction::{AccountMeta, Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use spl_token::instruction as token_instruction;

use crate::mock_pool::{self, MockPoolState};

// Re-export for convenience
pub use solana_program_test::ProgramTestContext;

pub type FuzzResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Seeded into the pool reserve so claimed yield can be paid out
pub const RESERVE_BACKING: u64 = 1_000_000_000_000;

/// Bank with the vault and the mock pool loaded
pub struct FuzzTestEnv {
    pub program_id: Pubkey,
    pub context: ProgramTestContext,
    pub pool: PoolAccounts,
}

/// Protocol-level accounts (protocol state and vault authority)
#[derive(Debug)]
pub struct ProtocolAccounts {
    pub protocol_state: Pubkey,
    pub vault_authority: Pubkey,
    pub owner_keypair: Keypair,
}

/// The external pool and the two mints it trades
#[derive(Debug)]
pub struct PoolAccounts {
    pub program_id: Pubkey,
    pub pool_state: Pubkey,
    pub asset_mint: Keypair,
    pub asset_mint_authority: Keypair,
    pub share_mint: Keypair,
    pub reserve: Keypair,
    pub decimals: u8,
}

/// Index PDA and its custody accounts
#[derive(Debug, Clone)]
pub struct IndexAccounts {
    pub index: Pubkey,
    pub vault_asset_account: Pubkey,
    pub vault_share_account: Pubkey,
}

/// A holder with an asset account and a real balance on sub-account 0
#[derive(Debug)]
pub struct UserAccounts {
    pub owner: Keypair,
    pub asset_account: Pubkey,
    pub balance: Pubkey,
}

// ============================================================================
// Program Loading
// ============================================================================

fn process_vault_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    // Anchor's entry wants one lifetime for the slice and its elements
    let accounts = Box::leak(Box::new(accounts.to_vec()));
    portfolio_vault::entry(program_id, accounts, data)
}

/// Creates the bank with both programs and a funded pool state account
pub async fn setup_program_test(decimals: u8) -> FuzzTestEnv {
    let program_id = portfolio_vault::id();
    let pool_program = Pubkey::new_unique();

    let mut program_test = ProgramTest::new(
        "portfolio_vault",
        program_id,
        processor!(process_vault_instruction),
    );
    program_test.add_program(
        "mock_pool",
        pool_program,
        processor!(mock_pool::process_instruction),
    );

    let asset_mint = Keypair::new();
    let share_mint = Keypair::new();
    let (pool_state, _) = mock_pool::derive_pool_state_pda(&pool_program);

    program_test.add_account(
        pool_state,
        Account {
            lamports: 1_000_000_000,
            data: MockPoolState::new(asset_mint.pubkey(), share_mint.pubkey()).to_bytes(),
            owner: pool_program,
            executable: false,
            rent_epoch: 0,
        },
    );

    let context = program_test.start_with_context().await;

    FuzzTestEnv {
        program_id,
        context,
        pool: PoolAccounts {
            program_id: pool_program,
            pool_state,
            asset_mint,
            asset_mint_authority: Keypair::new(),
            share_mint,
            reserve: Keypair::new(),
            decimals,
        },
    }
}

// ============================================================================
// Core Setup Functions
// ============================================================================

/// Sends `instructions` paid by the context payer
pub async fn send(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let mut all_signers: Vec<&Keypair> = vec![&context.payer];
    all_signers.extend_from_slice(signers);

    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        &all_signers,
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await
}

/// Anchor error code carried by a failed transaction, if any
pub fn custom_error_code(err: &BanksClientError) -> Option<u32> {
    match err {
        BanksClientError::TransactionError(TransactionError::InstructionError(
            _,
            InstructionError::Custom(code),
        ))
        | BanksClientError::SimulationError {
            err: TransactionError::InstructionError(_, InstructionError::Custom(code)),
            ..
        } => Some(*code),
        _ => None,
    }
}

pub async fn fund(context: &mut ProgramTestContext, to: &Pubkey) -> FuzzResult<()> {
    let ix = solana_sdk::system_instruction::transfer(&context.payer.pubkey(), to, 1_000_000_000);
    send(context, &[ix], &[]).await?;
    Ok(())
}

pub async fn create_mint(
    context: &mut ProgramTestContext,
    mint: &Keypair,
    authority: &Pubkey,
    decimals: u8,
) -> FuzzResult<()> {
    let rent = context.banks_client.get_rent().await?;
    let mint_len = 82; // Size of Mint account in SPL Token program

    let create_account_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &mint.pubkey(),
        rent.minimum_balance(mint_len),
        mint_len as u64,
        &spl_token::id(),
    );
    let init_mint_ix =
        token_instruction::initialize_mint(&spl_token::id(), &mint.pubkey(), authority, None, decimals)?;

    send(context, &[create_account_ix, init_mint_ix], &[mint]).await?;
    Ok(())
}

pub async fn create_token_account(
    context: &mut ProgramTestContext,
    account: &Keypair,
    mint: &Pubkey,
    owner: &Pubkey,
) -> FuzzResult<()> {
    let rent = context.banks_client.get_rent().await?;
    let account_len = 165; // Size of Token account in SPL Token program

    let create_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &account.pubkey(),
        rent.minimum_balance(account_len),
        account_len as u64,
        &spl_token::id(),
    );
    let init_ix = token_instruction::initialize_account(&spl_token::id(), &account.pubkey(), mint, owner)?;

    send(context, &[create_ix, init_ix], &[account]).await?;
    Ok(())
}

/// Mints the underlying asset; the test holds its mint authority
pub async fn mint_asset(env: &mut FuzzTestEnv, destination: &Pubkey, amount: u64) -> FuzzResult<()> {
    let ix = token_instruction::mint_to(
        &spl_token::id(),
        &env.pool.asset_mint.pubkey(),
        destination,
        &env.pool.asset_mint_authority.pubkey(),
        &[],
        amount,
    )?;
    send(&mut env.context, &[ix], &[&env.pool.asset_mint_authority]).await?;
    Ok(())
}

/// Creates both mints and the pool reserve, then initializes the protocol
pub async fn setup_protocol(env: &mut FuzzTestEnv) -> FuzzResult<ProtocolAccounts> {
    let pool_state = env.pool.pool_state;
    let decimals = env.pool.decimals;
    let asset_authority = env.pool.asset_mint_authority.pubkey();

    create_mint(&mut env.context, &env.pool.asset_mint, &asset_authority, decimals).await?;
    create_mint(&mut env.context, &env.pool.share_mint, &pool_state, decimals).await?;
    create_token_account(
        &mut env.context,
        &env.pool.reserve,
        &env.pool.asset_mint.pubkey(),
        &pool_state,
    )
    .await?;
    let reserve = env.pool.reserve.pubkey();
    mint_asset(env, &reserve, RESERVE_BACKING).await?;

    let owner_keypair = Keypair::new();
    let (protocol_state, _) = derive_protocol_state_pda(&env.program_id);
    let (vault_authority, _) = derive_vault_authority_pda(&env.program_id);

    let accounts = portfolio_vault::accounts::Initialize {
        protocol_state,
        vault_authority,
        owner: owner_keypair.pubkey(),
        payer: env.context.payer.pubkey(),
        system_program: solana_sdk::system_program::ID,
    };
    let ix = Instruction {
        program_id: env.program_id,
        accounts: accounts.to_account_metas(None),
        data: portfolio_vault::instruction::Initialize {}.data(),
    };
    send(&mut env.context, &[ix], &[&owner_keypair]).await?;

    Ok(ProtocolAccounts {
        protocol_state,
        vault_authority,
        owner_keypair,
    })
}

pub fn initialize_index_ix(
    env: &FuzzTestEnv,
    protocol: &ProtocolAccounts,
    owner: &Pubkey,
    bootstrap_floor: u64,
) -> Instruction {
    let index = derive_index_accounts(env);

    let accounts = portfolio_vault::accounts::InitializeIndex {
        protocol_state: protocol.protocol_state,
        index: index.index,
        asset_mint: env.pool.asset_mint.pubkey(),
        pool_program: env.pool.program_id,
        pool_state: env.pool.pool_state,
        pool_share_mint: env.pool.share_mint.pubkey(),
        vault_asset_account: index.vault_asset_account,
        vault_share_account: index.vault_share_account,
        vault_authority: protocol.vault_authority,
        owner: *owner,
        payer: env.context.payer.pubkey(),
        system_program: solana_sdk::system_program::ID,
        token_program: spl_token::id(),
    };

    Instruction {
        program_id: env.program_id,
        accounts: accounts.to_account_metas(None),
        data: portfolio_vault::instruction::InitializeIndex { bootstrap_floor }.data(),
    }
}

pub async fn setup_index(
    env: &mut FuzzTestEnv,
    protocol: &ProtocolAccounts,
    bootstrap_floor: u64,
) -> FuzzResult<IndexAccounts> {
    let ix = initialize_index_ix(env, protocol, &protocol.owner_keypair.pubkey(), bootstrap_floor);
    send(&mut env.context, &[ix], &[&protocol.owner_keypair]).await?;
    Ok(derive_index_accounts(env))
}

pub fn open_balance_ix(
    env: &FuzzTestEnv,
    index: &IndexAccounts,
    owner: &Pubkey,
    sub_account: u16,
) -> Instruction {
    let accounts = portfolio_vault::accounts::OpenBalance {
        index: index.index,
        balance: derive_balance_pda(&env.program_id, &index.index, owner, sub_account).0,
        owner: *owner,
        payer: env.context.payer.pubkey(),
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: env.program_id,
        accounts: accounts.to_account_metas(None),
        data: portfolio_vault::instruction::OpenBalance { sub_account }.data(),
    }
}

/// Funded holder with `asset_balance` tokens and an opened sub-account 0
pub async fn setup_user(
    env: &mut FuzzTestEnv,
    index: &IndexAccounts,
    asset_balance: u64,
) -> FuzzResult<UserAccounts> {
    let owner = Keypair::new();
    fund(&mut env.context, &owner.pubkey()).await?;

    let asset_account = Keypair::new();
    let asset_mint = env.pool.asset_mint.pubkey();
    create_token_account(&mut env.context, &asset_account, &asset_mint, &owner.pubkey()).await?;
    if asset_balance > 0 {
        mint_asset(env, &asset_account.pubkey(), asset_balance).await?;
    }

    let ix = open_balance_ix(env, index, &owner.pubkey(), 0);
    send(&mut env.context, &[ix], &[]).await?;

    let balance = derive_balance_pda(&env.program_id, &index.index, &owner.pubkey(), 0).0;
    Ok(UserAccounts {
        owner,
        asset_account: asset_account.pubkey(),
        balance,
    })
}

/// Sets up everything: bank, protocol, one index
pub async fn setup_complete_environment(
    decimals: u8,
    bootstrap_floor: u64,
) -> FuzzResult<(FuzzTestEnv, ProtocolAccounts, IndexAccounts)> {
    let mut env = setup_program_test(decimals).await;
    let protocol = setup_protocol(&mut env).await?;
    let index = setup_index(&mut env, &protocol, bootstrap_floor).await?;
    Ok((env, protocol, index))
}

// ============================================================================
// Instruction Builders
// ============================================================================

fn external_pool_accounts(
    env: &FuzzTestEnv,
    index: &IndexAccounts,
) -> portfolio_vault::accounts::ExternalPool {
    portfolio_vault::accounts::ExternalPool {
        pool_program: env.pool.program_id,
        pool_state: env.pool.pool_state,
        pool_asset_reserve: env.pool.reserve.pubkey(),
        pool_share_mint: env.pool.share_mint.pubkey(),
        vault_asset_account: index.vault_asset_account,
        vault_share_account: index.vault_share_account,
        vault_authority: derive_vault_authority_pda(&env.program_id).0,
        token_program: spl_token::id(),
    }
}

pub fn deposit_ix(
    env: &FuzzTestEnv,
    index: &IndexAccounts,
    user: &UserAccounts,
    amount: u64,
    min_real_out: u64,
) -> Instruction {
    let accounts = portfolio_vault::accounts::Deposit {
        index: index.index,
        asset_mint: env.pool.asset_mint.pubkey(),
        depositor_balance: user.balance,
        depositor_asset_account: user.asset_account,
        depositor: user.owner.pubkey(),
        pool: external_pool_accounts(env, index),
    };

    Instruction {
        program_id: env.program_id,
        accounts: accounts.to_account_metas(None),
        data: portfolio_vault::instruction::Deposit {
            amount,
            min_real_out,
            sub_account: 0,
        }
        .data(),
    }
}

pub fn withdraw_ix(
    env: &FuzzTestEnv,
    index: &IndexAccounts,
    user: &UserAccounts,
    real_amount: u64,
    min_asset_out: u64,
) -> Instruction {
    let accounts = portfolio_vault::accounts::Withdraw {
        index: index.index,
        asset_mint: env.pool.asset_mint.pubkey(),
        owner_balance: user.balance,
        owner_asset_account: user.asset_account,
        owner: user.owner.pubkey(),
        pool: external_pool_accounts(env, index),
    };

    Instruction {
        program_id: env.program_id,
        accounts: accounts.to_account_metas(None),
        data: portfolio_vault::instruction::Withdraw {
            real_amount,
            min_asset_out,
            sub_account: 0,
        }
        .data(),
    }
}

pub fn transfer_ix(
    env: &FuzzTestEnv,
    index: &IndexAccounts,
    from: &UserAccounts,
    to_balance: &Pubkey,
    real_amount: u64,
) -> Instruction {
    let accounts = portfolio_vault::accounts::Transfer {
        index: index.index,
        from_balance: from.balance,
        to_balance: *to_balance,
        owner: from.owner.pubkey(),
        pool: external_pool_accounts(env, index),
    };

    Instruction {
        program_id: env.program_id,
        accounts: accounts.to_account_metas(None),
        data: portfolio_vault::instruction::Transfer {
            real_amount,
            from_sub_account: 0,
        }
        .data(),
    }
}

pub fn sub_transfer_ix(
    env: &FuzzTestEnv,
    index: &IndexAccounts,
    owner: &Keypair,
    from_sub_account: u16,
    to_sub_account: u16,
    real_amount: u64,
) -> Instruction {
    let owner_key = owner.pubkey();
    let accounts = portfolio_vault::accounts::SubTransfer {
        index: index.index,
        from_balance: derive_balance_pda(&env.program_id, &index.index, &owner_key, from_sub_account).0,
        to_balance: derive_balance_pda(&env.program_id, &index.index, &owner_key, to_sub_account).0,
        owner: owner_key,
        pool: external_pool_accounts(env, index),
    };

    Instruction {
        program_id: env.program_id,
        accounts: accounts.to_account_metas(None),
        data: portfolio_vault::instruction::SubTransfer {
            from_sub_account,
            to_sub_account,
            real_amount,
        }
        .data(),
    }
}

fn mock_pool_ix(env: &FuzzTestEnv, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Instruction {
    Instruction {
        program_id: env.pool.program_id,
        accounts,
        data,
    }
}

/// Books yield the pool reports on its next claim
pub async fn accrue_yield(env: &mut FuzzTestEnv, amount: u64) -> FuzzResult<()> {
    let mut data = vec![mock_pool::ACCRUE_TAG];
    data.extend_from_slice(&amount.to_le_bytes());
    let ix = mock_pool_ix(env, vec![AccountMeta::new(env.pool.pool_state, false)], data);
    send(&mut env.context, &[ix], &[]).await?;
    Ok(())
}

pub async fn set_pool_flags(env: &mut FuzzTestEnv, deposits: bool, withdrawals: bool) -> FuzzResult<()> {
    let data = vec![mock_pool::SET_FLAGS_TAG, deposits as u8, withdrawals as u8];
    let ix = mock_pool_ix(env, vec![AccountMeta::new(env.pool.pool_state, false)], data);
    send(&mut env.context, &[ix], &[]).await?;
    Ok(())
}

/// Mints pool shares straight into `destination` without the pool booking them
pub async fn donate_shares(env: &mut FuzzTestEnv, destination: &Pubkey, amount: u64) -> FuzzResult<()> {
    let mut data = vec![mock_pool::AIRDROP_TAG];
    data.extend_from_slice(&amount.to_le_bytes());
    let accounts = vec![
        AccountMeta::new_readonly(env.pool.pool_state, false),
        AccountMeta::new(env.pool.share_mint.pubkey(), false),
        AccountMeta::new(*destination, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];
    let ix = mock_pool_ix(env, accounts, data);
    send(&mut env.context, &[ix], &[]).await?;
    Ok(())
}

// ============================================================================
// PDA Derivation Helpers
// ============================================================================

pub fn derive_protocol_state_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[portfolio_vault::PROTOCOL_STATE_SEED], program_id)
}

pub fn derive_vault_authority_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[portfolio_vault::VAULT_AUTHORITY_SEED], program_id)
}

pub fn derive_index_accounts(env: &FuzzTestEnv) -> IndexAccounts {
    let program_id = &env.program_id;
    let (index, _) = Pubkey::find_program_address(
        &[
            portfolio_vault::INDEX_SEED,
            env.pool.asset_mint.pubkey().as_ref(),
            env.pool.pool_state.as_ref(),
        ],
        program_id,
    );
    let (vault_asset_account, _) =
        Pubkey::find_program_address(&[portfolio_vault::VAULT_ASSET_SEED, index.as_ref()], program_id);
    let (vault_share_account, _) =
        Pubkey::find_program_address(&[portfolio_vault::VAULT_SHARE_SEED, index.as_ref()], program_id);

    IndexAccounts {
        index,
        vault_asset_account,
        vault_share_account,
    }
}

pub fn derive_balance_pda(
    program_id: &Pubkey,
    index: &Pubkey,
    owner: &Pubkey,
    sub_account: u16,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            portfolio_vault::BALANCE_SEED,
            index.as_ref(),
            owner.as_ref(),
            &sub_account.to_le_bytes(),
        ],
        program_id,
    )
}

// ============================================================================
// Account State Verification Helpers
// ============================================================================

pub async fn get_index_state(context: &mut ProgramTestContext, index: &Pubkey) -> FuzzResult<IndexState> {
    let account = context
        .banks_client
        .get_account(*index)
        .await?
        .ok_or("Index account not found")?;

    Ok(IndexState::try_deserialize(&mut account.data.as_ref())?)
}

pub async fn get_real_balance(context: &mut ProgramTestContext, balance: &Pubkey) -> FuzzResult<u64> {
    let account = context
        .banks_client
        .get_account(*balance)
        .await?
        .ok_or("Balance account not found")?;

    Ok(RealBalance::try_deserialize(&mut account.data.as_ref())?.amount)
}

pub async fn get_protocol_state(
    context: &mut ProgramTestContext,
    protocol_state: &Pubkey,
) -> FuzzResult<ProtocolState> {
    let account = context
        .banks_client
        .get_account(*protocol_state)
        .await?
        .ok_or("Protocol state account not found")?;

    Ok(ProtocolState::try_deserialize(&mut account.data.as_ref())?)
}

/// Get token account balance
pub async fn get_token_balance(context: &mut ProgramTestContext, account: &Pubkey) -> FuzzResult<u64> {
    let account_data = context
        .banks_client
        .get_account(*account)
        .await?
        .ok_or("Token account not found")?;

    // Token account structure: amount is at offset 64 (u64)
    if account_data.data.len() < 72 {
        return Err("Invalid token account data".into());
    }

    let amount = u64::from_le_bytes(
        account_data.data[64..72]
            .try_into()
            .map_err(|_| "Failed to parse amount")?,
    );

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio_vault::error::VaultError;

    fn code(error: VaultError) -> Option<u32> {
        Some(u32::from(error))
    }

    async fn totals(env: &mut FuzzTestEnv, index: &IndexAccounts) -> (u64, u64) {
        let state = get_index_state(&mut env.context, &index.index).await.unwrap();
        (state.virtual_total, state.real_total)
    }

    #[tokio::test]
    async fn test_initialize_records_owner() {
        let mut env = setup_program_test(9).await;
        let protocol = setup_protocol(&mut env).await.unwrap();

        let state = get_protocol_state(&mut env.context, &protocol.protocol_state)
            .await
            .unwrap();
        assert_eq!(state.owner, protocol.owner_keypair.pubkey());
    }

    #[tokio::test]
    async fn test_initialize_index_guards() {
        let mut env = setup_program_test(6).await;
        let protocol = setup_protocol(&mut env).await.unwrap();

        let intruder = Keypair::new();
        let ix = initialize_index_ix(&env, &protocol, &intruder.pubkey(), 2_000);
        let err = send(&mut env.context, &[ix], &[&intruder]).await.unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::Unauthorized));

        let owner = protocol.owner_keypair.pubkey();
        let ix = initialize_index_ix(&env, &protocol, &owner, 999);
        let err = send(&mut env.context, &[ix], &[&protocol.owner_keypair])
            .await
            .unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::InvalidBootstrapFloor));

        let index = setup_index(&mut env, &protocol, 2_000).await.unwrap();
        let state = get_index_state(&mut env.context, &index.index).await.unwrap();
        assert_eq!(state.scaling_factor, 1_000);
        assert_eq!(state.bootstrap_floor, 2_000);
        assert_eq!(state.vault_share_account, index.vault_share_account);
    }

    #[tokio::test]
    async fn test_bootstrap_then_share_donation_is_ignored() {
        let (mut env, _protocol, index) = setup_complete_environment(9, 2_000).await.unwrap();
        let alice = setup_user(&mut env, &index, 10_000).await.unwrap();
        let bob = setup_user(&mut env, &index, 10_000).await.unwrap();

        let ix = deposit_ix(&env, &index, &alice, 1_000, 0);
        let err = send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::BootstrapViolation));
        assert_eq!(get_token_balance(&mut env.context, &alice.asset_account).await.unwrap(), 10_000);

        let ix = deposit_ix(&env, &index, &alice, 2_000, 2_000);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();
        assert_eq!(totals(&mut env, &index).await, (2_000, 2_000));
        assert_eq!(get_real_balance(&mut env.context, &alice.balance).await.unwrap(), 2_000);
        // the pool pulled the assets out of custody and paid shares in
        assert_eq!(get_token_balance(&mut env.context, &index.vault_asset_account).await.unwrap(), 0);
        assert_eq!(get_token_balance(&mut env.context, &index.vault_share_account).await.unwrap(), 2_000);

        donate_shares(&mut env, &index.vault_share_account, 10_000_000).await.unwrap();

        // bob's deposit harvests first; the donation is not reported as yield
        let ix = deposit_ix(&env, &index, &bob, 4_000, 1);
        send(&mut env.context, &[ix], &[&bob.owner]).await.unwrap();
        assert_eq!(totals(&mut env, &index).await, (6_000, 6_000));
        assert_eq!(get_real_balance(&mut env.context, &bob.balance).await.unwrap(), 4_000);
        assert_eq!(
            get_token_balance(&mut env.context, &index.vault_share_account).await.unwrap(),
            10_006_000
        );
    }

    #[tokio::test]
    async fn test_transfer_harvests_only_reported_yield() {
        let (mut env, _protocol, index) = setup_complete_environment(9, 2_000).await.unwrap();
        let alice = setup_user(&mut env, &index, 10_000).await.unwrap();
        let bob = setup_user(&mut env, &index, 0).await.unwrap();

        let ix = deposit_ix(&env, &index, &alice, 2_000, 0);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();

        accrue_yield(&mut env, 500).await.unwrap();
        donate_shares(&mut env, &index.vault_share_account, 1_000).await.unwrap();

        let ix = transfer_ix(&env, &index, &alice, &bob.balance, 1_000);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();

        assert_eq!(totals(&mut env, &index).await, (2_500, 2_000));
        assert_eq!(get_real_balance(&mut env.context, &alice.balance).await.unwrap(), 1_000);
        assert_eq!(get_real_balance(&mut env.context, &bob.balance).await.unwrap(), 1_000);
    }

    #[tokio::test]
    async fn test_withdraw_pays_pool_assets_and_leaves_donations() {
        let (mut env, _protocol, index) = setup_complete_environment(9, 2_000).await.unwrap();
        let alice = setup_user(&mut env, &index, 10_000).await.unwrap();

        let ix = deposit_ix(&env, &index, &alice, 3_000, 0);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();

        accrue_yield(&mut env, 300).await.unwrap();
        let custody = index.vault_asset_account;
        mint_asset(&mut env, &custody, 777).await.unwrap();

        // 1_000 real units are worth 1_000 * 3_300 / 3_000 shares
        let ix = withdraw_ix(&env, &index, &alice, 1_000, 1_100);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();

        assert_eq!(totals(&mut env, &index).await, (2_200, 2_000));
        assert_eq!(
            get_token_balance(&mut env.context, &alice.asset_account).await.unwrap(),
            10_000 - 3_000 + 1_100
        );
        assert_eq!(get_token_balance(&mut env.context, &custody).await.unwrap(), 777);
    }

    #[tokio::test]
    async fn test_withdraw_slippage_reverts_everything() {
        let (mut env, _protocol, index) = setup_complete_environment(9, 2_000).await.unwrap();
        let alice = setup_user(&mut env, &index, 10_000).await.unwrap();

        let ix = deposit_ix(&env, &index, &alice, 3_000, 0);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();
        accrue_yield(&mut env, 300).await.unwrap();

        let ix = withdraw_ix(&env, &index, &alice, 1_000, 1_101);
        let err = send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::SlippageExceeded));

        // the harvest inside the failed call was rolled back too
        assert_eq!(totals(&mut env, &index).await, (3_000, 3_000));
        assert_eq!(get_real_balance(&mut env.context, &alice.balance).await.unwrap(), 3_000);
    }

    #[tokio::test]
    async fn test_withdraw_allowed_while_deposits_paused() {
        let (mut env, _protocol, index) = setup_complete_environment(9, 2_000).await.unwrap();
        let alice = setup_user(&mut env, &index, 10_000).await.unwrap();

        let ix = deposit_ix(&env, &index, &alice, 4_000, 0);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();

        set_pool_flags(&mut env, false, true).await.unwrap();

        let ix = deposit_ix(&env, &index, &alice, 2_500, 0);
        let err = send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::DepositsPaused));

        let ix = withdraw_ix(&env, &index, &alice, 1_500, 0);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();
        assert_eq!(totals(&mut env, &index).await, (2_500, 2_500));
    }

    #[tokio::test]
    async fn test_transfer_to_same_balance_is_rejected() {
        let (mut env, _protocol, index) = setup_complete_environment(9, 2_000).await.unwrap();
        let alice = setup_user(&mut env, &index, 10_000).await.unwrap();

        let ix = deposit_ix(&env, &index, &alice, 2_000, 0);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();

        let ix = transfer_ix(&env, &index, &alice, &alice.balance, 500);
        assert!(send(&mut env.context, &[ix], &[&alice.owner]).await.is_err());

        assert_eq!(get_real_balance(&mut env.context, &alice.balance).await.unwrap(), 2_000);
        assert_eq!(totals(&mut env, &index).await, (2_000, 2_000));
    }

    #[tokio::test]
    async fn test_sub_transfer_between_own_sub_accounts() {
        let (mut env, _protocol, index) = setup_complete_environment(9, 2_000).await.unwrap();
        let alice = setup_user(&mut env, &index, 10_000).await.unwrap();

        let ix = deposit_ix(&env, &index, &alice, 2_000, 0);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();

        let ix = open_balance_ix(&env, &index, &alice.owner.pubkey(), 7);
        send(&mut env.context, &[ix], &[]).await.unwrap();

        let ix = sub_transfer_ix(&env, &index, &alice.owner, 0, 7, 600);
        send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap();

        let savings = derive_balance_pda(&env.program_id, &index.index, &alice.owner.pubkey(), 7).0;
        assert_eq!(get_real_balance(&mut env.context, &alice.balance).await.unwrap(), 1_400);
        assert_eq!(get_real_balance(&mut env.context, &savings).await.unwrap(), 600);
        assert_eq!(totals(&mut env, &index).await, (2_000, 2_000));
    }

    #[tokio::test]
    async fn test_pool_accounts_must_match_index() {
        let (mut env, _protocol, index) = setup_complete_environment(9, 2_000).await.unwrap();
        let alice = setup_user(&mut env, &index, 10_000).await.unwrap();

        // a look-alike custody account the index never recorded
        let stray = Keypair::new();
        let share_mint = env.pool.share_mint.pubkey();
        let vault_authority = derive_vault_authority_pda(&env.program_id).0;
        create_token_account(&mut env.context, &stray, &share_mint, &vault_authority)
            .await
            .unwrap();

        let swapped = IndexAccounts {
            vault_share_account: stray.pubkey(),
            ..index.clone()
        };
        let ix = deposit_ix(&env, &swapped, &alice, 2_000, 0);
        let err = send(&mut env.context, &[ix], &[&alice.owner]).await.unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::InvalidPoolState));
        assert_eq!(totals(&mut env, &index).await, (0, 0));
    }
}
