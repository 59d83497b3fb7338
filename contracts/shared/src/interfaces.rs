//! Typed clients for the cross-contract seams. Each pool receives collaborator
//! addresses at initialization and talks to them through these clients; a
//! failure inside a nested call traps and aborts the whole outer invocation.

use soroban_sdk::{contractclient, Address, Env, Vec};

use crate::types::{Amount, ClaimRight, ClaimRightStats, PoolType, SourceStats};

/// Claim-right registry consumed by both pool tiers.
#[contractclient(name = "ClaimRightsClient")]
pub trait ClaimRightsInterface {
    fn mint(env: Env, issuing_pool: Address, pool_type: PoolType, owner: Address) -> u64;
    fn burn(env: Env, id: u64, caller: Address);
    fn owner_of(env: Env, id: u64) -> Address;
    fn get_right(env: Env, id: u64) -> ClaimRight;
    fn list_by_owner(env: Env, owner: Address) -> Vec<u64>;
    fn list_by_owner_and_pool(env: Env, owner: Address, pool: Address, pool_type: PoolType)
        -> Vec<u64>;
}

/// Protocol configuration: pool registry flags, take rate, treasury.
#[contractclient(name = "ProtocolConfigClient")]
pub trait ProtocolConfigInterface {
    fn is_valid_individual_pool(env: Env, pool: Address) -> bool;
    fn is_valid_aggregate_pool(env: Env, pool: Address) -> bool;
    fn protocol_take_rate(env: Env) -> i128;
    fn take_rate_precision(env: Env) -> i128;
    fn treasury_address(env: Env) -> Address;
    fn admin_address(env: Env) -> Address;
}

/// The surface of an individual pool that an aggregate pool drives.
#[contractclient(name = "IndividualPoolClient")]
pub trait IndividualPoolInterface {
    fn invest_for(env: Env, caller_pool: Address, claim_right_id: u64, amount: Amount);
    fn claim_for(env: Env, caller_pool: Address, investor: Address, claim_right_ids: Vec<u64>)
        -> Amount;
    fn remove_undeployed_for(
        env: Env,
        caller_pool: Address,
        claim_right_id: u64,
        investor: Address,
    ) -> Amount;
    fn pool_token(env: Env) -> Address;
    fn claim_right_stats(env: Env, id: u64) -> ClaimRightStats;
    fn source_stats(env: Env, source: Address) -> SourceStats;
}
