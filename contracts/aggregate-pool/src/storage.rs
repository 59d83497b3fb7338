use shared::errors::Error;
use shared::types::Amount;
use soroban_sdk::{contracttype, Address, Env, Vec};

/// Aggregate pool configuration, fixed at initialization.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    /// Value unit; every child pool must account in the same token
    pub token: Address,
    /// The only party allowed to change allocations
    pub manager: Address,
    /// Cap on total capital routed through this pool; 0 disables the check
    pub pool_investment_limit: Amount,
    /// Cap on one investor's cumulative investment; 0 disables the check
    pub investor_investment_limit: Amount,
    /// Claim-right registry contract
    pub claim_rights: Address,
    /// Protocol configuration contract
    pub protocol_config: Address,
}

/// Storage keys for the aggregate pool
#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    /// Pool configuration
    Config,
    /// Allocation percentage keyed by child pool
    Allocation(Address),
    /// Child pools in the live allocation set, in rounding-correction order
    CurrentPools,
    /// Every child pool ever allocated, append-only
    EverPools,
    /// Cumulative amount invested by an investor
    InvestorTotal(Address),
}

pub fn set_config(env: &Env, config: &PoolConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn get_config(env: &Env) -> Result<PoolConfig, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInit)
}

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_allocation(env: &Env, pool: &Address) -> Amount {
    env.storage()
        .persistent()
        .get(&DataKey::Allocation(pool.clone()))
        .unwrap_or(0)
}

pub fn set_allocation(env: &Env, pool: &Address, percentage: Amount) {
    env.storage()
        .persistent()
        .set(&DataKey::Allocation(pool.clone()), &percentage);
}

pub fn remove_allocation(env: &Env, pool: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::Allocation(pool.clone()));
}

pub fn get_current_pools(env: &Env) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::CurrentPools)
        .unwrap_or(Vec::new(env))
}

pub fn set_current_pools(env: &Env, pools: &Vec<Address>) {
    env.storage().persistent().set(&DataKey::CurrentPools, pools);
}

pub fn get_ever_pools(env: &Env) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::EverPools)
        .unwrap_or(Vec::new(env))
}

/// Append `pool` to the ever-allocated list if it is not there yet.
pub fn remember_pool(env: &Env, pool: &Address) {
    let mut pools = get_ever_pools(env);
    if !pools.contains(pool) {
        pools.push_back(pool.clone());
        env.storage().persistent().set(&DataKey::EverPools, &pools);
    }
}

pub fn get_investor_total(env: &Env, investor: &Address) -> Amount {
    env.storage()
        .persistent()
        .get(&DataKey::InvestorTotal(investor.clone()))
        .unwrap_or(0)
}

pub fn set_investor_total(env: &Env, investor: &Address, value: Amount) {
    env.storage()
        .persistent()
        .set(&DataKey::InvestorTotal(investor.clone()), &value);
}
