#![cfg(test)]

use crate::{AggregatePoolContract, AggregatePoolContractClient};
use claim_rights::{ClaimRightsContract, ClaimRightsContractClient};
use individual_pool::{IndividualPoolContract, IndividualPoolContractClient};
use protocol_config::{ProtocolConfigContract, ProtocolConfigContractClient};
use shared::constants::ALLOCATION_TOTAL;
use shared::errors::Error;
use shared::types::PoolType;
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{token, vec, Address, Env};

struct Setup<'a> {
    token: token::Client<'a>,
    token_admin: token::StellarAssetClient<'a>,
    registry: ClaimRightsContractClient<'a>,
    pool_a: IndividualPoolContractClient<'a>,
    pool_a_id: Address,
    pool_b: IndividualPoolContractClient<'a>,
    pool_b_id: Address,
    aggregate: AggregatePoolContractClient<'a>,
    aggregate_id: Address,
}

/// Two registered individual pools behind one aggregate, 5% take rate.
fn setup_with(env: &Env, pool_limit: i128, investor_limit: i128) -> Setup {
    env.mock_all_auths();

    let admin = Address::generate(env);
    let treasury = Address::generate(env);
    let manager = Address::generate(env);

    let token_id = env.register_stellar_asset_contract(admin.clone());
    let token = token::Client::new(env, &token_id);
    let token_admin = token::StellarAssetClient::new(env, &token_id);

    let config_id = env.register_contract(None, ProtocolConfigContract);
    let config = ProtocolConfigContractClient::new(env, &config_id);
    config.initialize(&admin, &treasury, &500, &10_000);

    let registry_id = env.register_contract(None, ClaimRightsContract);
    let registry = ClaimRightsContractClient::new(env, &registry_id);
    registry.initialize(&config_id);

    let recipient_a = Address::generate(env);
    let pool_a_id = env.register_contract(None, IndividualPoolContract);
    let pool_a = IndividualPoolContractClient::new(env, &pool_a_id);
    config.register_pool(&pool_a_id, &PoolType::Individual);
    pool_a.initialize(&token_id, &recipient_a, &1_000_000, &0, &registry_id, &config_id);

    let recipient_b = Address::generate(env);
    let pool_b_id = env.register_contract(None, IndividualPoolContract);
    let pool_b = IndividualPoolContractClient::new(env, &pool_b_id);
    config.register_pool(&pool_b_id, &PoolType::Individual);
    pool_b.initialize(&token_id, &recipient_b, &1_000_000, &0, &registry_id, &config_id);

    let aggregate_id = env.register_contract(None, AggregatePoolContract);
    let aggregate = AggregatePoolContractClient::new(env, &aggregate_id);
    config.register_pool(&aggregate_id, &PoolType::Aggregate);
    aggregate.initialize(
        &token_id,
        &manager,
        &pool_limit,
        &investor_limit,
        &registry_id,
        &config_id,
    );

    Setup {
        token,
        token_admin,
        registry,
        pool_a,
        pool_a_id,
        pool_b,
        pool_b_id,
        aggregate,
        aggregate_id,
    }
}

fn setup(env: &Env) -> Setup {
    setup_with(env, 0, 0)
}

fn funded_investor(s: &Setup, env: &Env, amount: i128) -> Address {
    let investor = Address::generate(env);
    s.token_admin.mint(&investor, &amount);
    investor
}

/// 60% to pool A, 40% to pool B.
fn allocate_60_40(env: &Env, s: &Setup) {
    s.aggregate.set_allocations(
        &vec![env, s.pool_a_id.clone(), s.pool_b_id.clone()],
        &vec![env, 600_000_i128, 400_000_i128],
    );
}

// ==================== Allocations ====================

#[test]
fn test_set_allocations_stores_exact_split() {
    let env = Env::default();
    let s = setup(&env);

    allocate_60_40(&env, &s);

    assert_eq!(s.aggregate.allocation_of(&s.pool_a_id), 600_000);
    assert_eq!(s.aggregate.allocation_of(&s.pool_b_id), 400_000);
    assert_eq!(s.aggregate.current_pools().len(), 2);
    assert_eq!(s.aggregate.ever_pools().len(), 2);
}

#[test]
fn test_set_allocations_corrects_rounding_into_first_pool() {
    let env = Env::default();
    let s = setup(&env);

    // 50 short of 100%; within the margin, so the first pool absorbs it
    s.aggregate.set_allocations(
        &vec![&env, s.pool_a_id.clone(), s.pool_b_id.clone()],
        &vec![&env, 599_950_i128, 400_000_i128],
    );

    assert_eq!(s.aggregate.allocation_of(&s.pool_a_id), 600_000);
    assert_eq!(s.aggregate.allocation_of(&s.pool_b_id), 400_000);
    assert_eq!(
        s.aggregate.allocation_of(&s.pool_a_id) + s.aggregate.allocation_of(&s.pool_b_id),
        ALLOCATION_TOTAL
    );
}

#[test]
fn test_correction_must_leave_first_pool_a_positive_share() {
    let env = Env::default();
    let s = setup(&env);

    // 99 over 100% is within the margin, but folding -99 into the first
    // pool would store a negative share
    assert_eq!(
        s.aggregate.try_set_allocations(
            &vec![&env, s.pool_a_id.clone(), s.pool_b_id.clone()],
            &vec![&env, 50_i128, 1_000_049_i128],
        ),
        Err(Ok(Error::AllocationMismatch))
    );
    // A share corrected to exactly zero is no allocation either
    assert_eq!(
        s.aggregate.try_set_allocations(
            &vec![&env, s.pool_a_id.clone(), s.pool_b_id.clone()],
            &vec![&env, 99_i128, 1_000_000_i128],
        ),
        Err(Ok(Error::AllocationMismatch))
    );
    // A first share that survives the correction is stored as corrected
    s.aggregate.set_allocations(
        &vec![&env, s.pool_a_id.clone(), s.pool_b_id.clone()],
        &vec![&env, 150_i128, 999_949_i128],
    );
    assert_eq!(s.aggregate.allocation_of(&s.pool_a_id), 51);
    assert_eq!(s.aggregate.allocation_of(&s.pool_b_id), 999_949);
}

#[test]
fn test_set_allocations_rejects_duplicate_pool() {
    let env = Env::default();
    let s = setup(&env);

    // One entry per pool; a repeat would double-queue each investment
    // under a single claim-right key
    assert_eq!(
        s.aggregate.try_set_allocations(
            &vec![&env, s.pool_a_id.clone(), s.pool_a_id.clone()],
            &vec![&env, 500_000_i128, 500_000_i128],
        ),
        Err(Ok(Error::InvalidPool))
    );
}

#[test]
fn test_set_allocations_input_errors() {
    let env = Env::default();
    let s = setup(&env);

    assert_eq!(
        s.aggregate.try_set_allocations(
            &vec![&env, s.pool_a_id.clone()],
            &vec![&env, 500_000_i128, 500_000_i128],
        ),
        Err(Ok(Error::LengthMismatch))
    );
    assert_eq!(
        s.aggregate
            .try_set_allocations(&vec![&env], &vec![&env]),
        Err(Ok(Error::EmptyInput))
    );
    assert_eq!(
        s.aggregate.try_set_allocations(
            &vec![&env, s.pool_a_id.clone(), s.pool_b_id.clone()],
            &vec![&env, 599_000_i128, 400_000_i128],
        ),
        Err(Ok(Error::AllocationMismatch))
    );
    assert_eq!(
        s.aggregate.try_set_allocations(
            &vec![&env, s.pool_a_id.clone(), s.pool_b_id.clone()],
            &vec![&env, 600_000_i128, 0_i128],
        ),
        Err(Ok(Error::InvalidAmount))
    );

    // A plain address is not a registered individual pool
    let stranger = Address::generate(&env);
    assert_eq!(
        s.aggregate
            .try_set_allocations(&vec![&env, stranger], &vec![&env, 1_000_000_i128]),
        Err(Ok(Error::InvalidPool))
    );
}

#[test]
fn test_reallocation_replaces_live_set_but_remembers_history() {
    let env = Env::default();
    let s = setup(&env);

    s.aggregate.set_allocations(
        &vec![&env, s.pool_a_id.clone()],
        &vec![&env, 1_000_000_i128],
    );
    s.aggregate.set_allocations(
        &vec![&env, s.pool_b_id.clone()],
        &vec![&env, 1_000_000_i128],
    );

    assert_eq!(s.aggregate.allocation_of(&s.pool_a_id), 0);
    assert_eq!(s.aggregate.allocation_of(&s.pool_b_id), 1_000_000);
    assert_eq!(s.aggregate.current_pools().len(), 1);
    // Pool A stays on the books for reads and claims
    assert_eq!(s.aggregate.ever_pools().len(), 2);
}

// ==================== Invest fan-out ====================

#[test]
fn test_invest_splits_by_allocation() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 1_000);

    let claim_id = s.aggregate.invest(&investor, &1_000);

    assert_eq!(s.registry.owner_of(&claim_id), investor);
    assert_eq!(s.token.balance(&s.pool_a_id), 600);
    assert_eq!(s.token.balance(&s.pool_b_id), 400);
    assert_eq!(s.token.balance(&s.aggregate_id), 0);
    assert_eq!(s.pool_a.undeployed_amount(), 600);
    assert_eq!(s.pool_b.undeployed_amount(), 400);
    assert_eq!(s.aggregate.undeployed_amount(), 1_000);
    assert_eq!(s.aggregate.invested_amount_of(&investor), 1_000);

    let stats = s.aggregate.claim_right_stats(&claim_id);
    assert_eq!(stats.undeployed, 1_000);
    assert_eq!(stats.deployed, 0);
}

#[test]
fn test_invest_floor_split_keeps_dust_here() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 1_001);

    s.aggregate.invest(&investor, &1_001);

    // floor(600.6) + floor(400.4): one unit is not forwarded anywhere
    assert_eq!(s.token.balance(&s.pool_a_id), 600);
    assert_eq!(s.token.balance(&s.pool_b_id), 400);
    assert_eq!(s.token.balance(&s.aggregate_id), 1);
    assert_eq!(s.aggregate.undeployed_amount(), 1_000);
}

#[test]
fn test_invest_error_paths() {
    let env = Env::default();
    let s = setup(&env);
    let investor = funded_investor(&s, &env, 100);

    // No live allocation set yet
    assert_eq!(
        s.aggregate.try_invest(&investor, &100),
        Err(Ok(Error::EmptyInput))
    );

    allocate_60_40(&env, &s);
    assert_eq!(
        s.aggregate.try_invest(&investor, &0),
        Err(Ok(Error::InvalidAmount))
    );
    assert_eq!(
        s.aggregate.try_invest(&investor, &101),
        Err(Ok(Error::InsufficientBalance))
    );
}

#[test]
fn test_pool_investment_limit() {
    let env = Env::default();
    let s = setup_with(&env, 1_000, 0);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 2_000);

    s.aggregate.invest(&investor, &600);
    assert_eq!(
        s.aggregate.try_invest(&investor, &500),
        Err(Ok(Error::PoolLimitExceeded))
    );
    s.aggregate.invest(&investor, &400);
}

#[test]
fn test_investor_investment_limit() {
    let env = Env::default();
    let s = setup_with(&env, 0, 500);
    allocate_60_40(&env, &s);
    let alice = funded_investor(&s, &env, 1_000);
    let bob = funded_investor(&s, &env, 1_000);

    s.aggregate.invest(&alice, &500);
    assert_eq!(
        s.aggregate.try_invest(&alice, &1),
        Err(Ok(Error::InvestorLimitExceeded))
    );
    // The cap is per investor, not pool-wide
    s.aggregate.invest(&bob, &500);
}

#[test]
fn test_reallocation_leaves_deployed_capital_in_place() {
    let env = Env::default();
    let s = setup(&env);
    s.aggregate.set_allocations(
        &vec![&env, s.pool_a_id.clone()],
        &vec![&env, 1_000_000_i128],
    );
    let investor = funded_investor(&s, &env, 2_000);

    s.aggregate.invest(&investor, &1_000);
    s.pool_a.withdraw(&400);

    s.aggregate.set_allocations(
        &vec![&env, s.pool_a_id.clone(), s.pool_b_id.clone()],
        &vec![&env, 500_000_i128, 500_000_i128],
    );
    s.aggregate.invest(&investor, &1_000);

    // The 400 deployed under the old split never moves
    assert_eq!(s.aggregate.deployed_amount(), 400);
    assert_eq!(s.aggregate.undeployed_amount(), 1_600);
    assert_eq!(s.pool_a.undeployed_amount(), 1_100);
    assert_eq!(s.pool_b.undeployed_amount(), 500);
}

// ==================== Claim fan-out ====================

#[test]
fn test_claim_fans_out_across_children() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 1_000);
    s.aggregate.invest(&investor, &1_000);

    s.pool_a.withdraw(&600);
    s.pool_a.contribute(&100);

    let paid = s.aggregate.claim(&investor);
    assert_eq!(paid, 95);
    assert_eq!(s.token.balance(&investor), 95);
    assert_eq!(s.aggregate.cumulative_dividends(), 95);

    // Nothing new accrued anywhere
    assert_eq!(s.aggregate.claim(&investor), 0);
}

#[test]
fn test_claim_covers_deallocated_children() {
    let env = Env::default();
    let s = setup(&env);
    s.aggregate.set_allocations(
        &vec![&env, s.pool_a_id.clone()],
        &vec![&env, 1_000_000_i128],
    );
    let investor = funded_investor(&s, &env, 1_000);
    s.aggregate.invest(&investor, &1_000);
    s.pool_a.withdraw(&1_000);

    // Pool A drops out of the live set, then realizes a return
    s.aggregate.set_allocations(
        &vec![&env, s.pool_b_id.clone()],
        &vec![&env, 1_000_000_i128],
    );
    s.pool_a.contribute(&200);

    assert_eq!(s.aggregate.claim(&investor), 190);
    assert_eq!(s.token.balance(&investor), 190);
}

#[test]
fn test_claim_without_rights_not_found() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let stranger = Address::generate(&env);

    assert_eq!(s.aggregate.try_claim(&stranger), Err(Ok(Error::NotFound)));
}

#[test]
fn test_two_investors_split_dividends_by_deployed_share() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let alice = funded_investor(&s, &env, 300);
    let bob = funded_investor(&s, &env, 700);

    s.aggregate.invest(&alice, &300);
    s.aggregate.invest(&bob, &700);

    // Pool A holds 180 + 420; deploy it all and return 100
    s.pool_a.withdraw(&600);
    s.pool_a.contribute(&100);

    // 95 split 180:420 with floors
    assert_eq!(s.aggregate.claim(&alice), 28);
    assert_eq!(s.aggregate.claim(&bob), 66);
}

// ==================== Remove undeployed ====================

#[test]
fn test_remove_undeployed_refunds_from_every_child_and_burns() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 1_000);
    let claim_id = s.aggregate.invest(&investor, &1_000);

    let removed = s.aggregate.remove_undeployed(&investor, &claim_id);

    assert_eq!(removed, 1_000);
    assert_eq!(s.token.balance(&investor), 1_000);
    assert_eq!(s.pool_a.undeployed_amount(), 0);
    assert_eq!(s.pool_b.undeployed_amount(), 0);
    assert_eq!(s.aggregate.invested_amount_of(&investor), 0);
    // No deployed capital backs the right anywhere, so it is burned
    assert_eq!(s.registry.try_owner_of(&claim_id), Err(Ok(Error::NotFound)));
}

#[test]
fn test_remove_undeployed_keeps_right_while_capital_is_deployed() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 1_000);
    let claim_id = s.aggregate.invest(&investor, &1_000);

    s.pool_a.withdraw(&300);
    let removed = s.aggregate.remove_undeployed(&investor, &claim_id);

    // 300 still queued in A plus the full 400 in B come back
    assert_eq!(removed, 700);
    assert_eq!(s.token.balance(&investor), 700);
    assert_eq!(s.registry.owner_of(&claim_id), investor);
    assert_eq!(s.aggregate.claim_right_stats(&claim_id).deployed, 300);
    assert_eq!(s.aggregate.invested_amount_of(&investor), 300);
}

#[test]
fn test_remove_undeployed_nothing_queued() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 1_000);
    let claim_id = s.aggregate.invest(&investor, &1_000);

    s.pool_a.withdraw(&600);
    s.pool_b.withdraw(&400);

    assert_eq!(
        s.aggregate.try_remove_undeployed(&investor, &claim_id),
        Err(Ok(Error::NotInQueue))
    );
}

#[test]
fn test_remove_undeployed_wrong_owner() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 1_000);
    let stranger = Address::generate(&env);
    let claim_id = s.aggregate.invest(&investor, &1_000);

    assert_eq!(
        s.aggregate.try_remove_undeployed(&stranger, &claim_id),
        Err(Ok(Error::NotOwner))
    );
}

// ==================== Aggregated reads ====================

#[test]
fn test_reads_track_child_books() {
    let env = Env::default();
    let s = setup(&env);
    allocate_60_40(&env, &s);
    let investor = funded_investor(&s, &env, 1_000);
    let claim_id = s.aggregate.invest(&investor, &1_000);

    s.pool_a.withdraw(&500);
    s.pool_b.withdraw(&100);

    assert_eq!(s.aggregate.deployed_amount(), 600);
    assert_eq!(s.aggregate.undeployed_amount(), 400);

    let stats = s.aggregate.claim_right_stats(&claim_id);
    assert_eq!(stats.deployed, 600);
    assert_eq!(stats.undeployed, 400);

    // A direct investor in pool A must not leak into this pool's slice
    let direct = funded_investor(&s, &env, 500);
    s.pool_a.invest(&direct, &500);
    assert_eq!(s.aggregate.undeployed_amount(), 400);
}

#[test]
fn test_initialize_guards() {
    let env = Env::default();
    let s = setup(&env);

    let manager = Address::generate(&env);
    let result = s.aggregate.try_initialize(
        &s.token.address,
        &manager,
        &0,
        &0,
        &s.registry.address,
        &s.registry.address,
    );
    assert_eq!(result, Err(Ok(Error::AlreadyInit)));
}
