use shared::errors::Error;
use shared::types::{Amount, SourceStats};
use soroban_sdk::{contracttype, Address, Env, Vec};

/// Pool configuration, fixed at initialization.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    /// Value unit this pool accounts in
    pub token: Address,
    /// The only party allowed to withdraw and contribute
    pub recipient: Address,
    /// Cap on the recipient's outstanding drawn-down balance
    pub recipient_max_balance: Amount,
    /// Cap per single investment; 0 disables the check
    pub max_investment: Amount,
    /// Claim-right registry contract
    pub claim_rights: Address,
    /// Protocol configuration contract
    pub protocol_config: Address,
}

/// Per-claim-right ledger position. `source` is who routed the capital in:
/// the investor for direct investments, the aggregate pool otherwise.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    pub source: Address,
    pub deployed: Amount,
    pub unclaimed: Amount,
    pub total_dividends: Amount,
}

/// Storage keys for the individual pool ledger
#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    /// Pool configuration
    Config,
    /// Capital drawn down by the recipient, cumulative
    TotalDeployed,
    /// Net dividends realized, cumulative
    CumulativeDividends,
    /// Recipient's outstanding drawn-down balance
    RecipientBalance,
    /// Timestamp of the first withdrawal, set once
    FirstWithdrawalAt,
    /// Deployment queue head slot
    QueueFirst,
    /// Deployment queue tail slot
    QueueLast,
    /// Deployment queue running total
    QueueTotal,
    /// Queue entry keyed by slot
    QueueEntry(u64),
    /// Claim-right id to queue slot
    QueuePosition(u64),
    /// Ledger position keyed by claim-right id
    Position(u64),
    /// Claim-right ids with a live position
    ActiveClaims,
    /// Cumulative amount claimed by an investor
    ClaimedTotal(Address),
    /// Per-source deployed/undeployed/dividend totals
    Source(Address),
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

pub fn get_total_deployed(env: &Env) -> Amount {
    env.storage().instance().get(&DataKey::TotalDeployed).unwrap_or(0)
}

pub fn set_total_deployed(env: &Env, value: Amount) {
    env.storage().instance().set(&DataKey::TotalDeployed, &value);
}

pub fn get_cumulative_dividends(env: &Env) -> Amount {
    env.storage()
        .instance()
        .get(&DataKey::CumulativeDividends)
        .unwrap_or(0)
}

pub fn set_cumulative_dividends(env: &Env, value: Amount) {
    env.storage()
        .instance()
        .set(&DataKey::CumulativeDividends, &value);
}

pub fn get_recipient_balance(env: &Env) -> Amount {
    env.storage()
        .instance()
        .get(&DataKey::RecipientBalance)
        .unwrap_or(0)
}

pub fn set_recipient_balance(env: &Env, value: Amount) {
    env.storage().instance().set(&DataKey::RecipientBalance, &value);
}

/// Record the first withdrawal timestamp; later withdrawals leave it alone.
pub fn record_first_withdrawal(env: &Env, timestamp: u64) {
    if !env.storage().instance().has(&DataKey::FirstWithdrawalAt) {
        env.storage()
            .instance()
            .set(&DataKey::FirstWithdrawalAt, &timestamp);
    }
}

pub fn get_first_withdrawal_at(env: &Env) -> Option<u64> {
    env.storage().instance().get(&DataKey::FirstWithdrawalAt)
}

pub fn set_position(env: &Env, id: u64, position: &Position) {
    env.storage().persistent().set(&DataKey::Position(id), position);
}

pub fn get_position(env: &Env, id: u64) -> Result<Position, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Position(id))
        .ok_or(Error::NotFound)
}

pub fn remove_position(env: &Env, id: u64) {
    env.storage().persistent().remove(&DataKey::Position(id));
}

pub fn get_active_claims(env: &Env) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::ActiveClaims)
        .unwrap_or(Vec::new(env))
}

pub fn add_active_claim(env: &Env, id: u64) {
    let mut claims = get_active_claims(env);
    claims.push_back(id);
    env.storage().persistent().set(&DataKey::ActiveClaims, &claims);
}

pub fn remove_active_claim(env: &Env, id: u64) {
    let mut claims = get_active_claims(env);
    if let Some(index) = claims.first_index_of(id) {
        claims.remove(index);
        env.storage().persistent().set(&DataKey::ActiveClaims, &claims);
    }
}

pub fn get_claimed_total(env: &Env, investor: &Address) -> Amount {
    env.storage()
        .persistent()
        .get(&DataKey::ClaimedTotal(investor.clone()))
        .unwrap_or(0)
}

pub fn set_claimed_total(env: &Env, investor: &Address, value: Amount) {
    env.storage()
        .persistent()
        .set(&DataKey::ClaimedTotal(investor.clone()), &value);
}

pub fn get_source_stats(env: &Env, source: &Address) -> SourceStats {
    env.storage()
        .persistent()
        .get(&DataKey::Source(source.clone()))
        .unwrap_or(SourceStats {
            deployed: 0,
            undeployed: 0,
            total_dividends: 0,
        })
}

pub fn set_source_stats(env: &Env, source: &Address, stats: &SourceStats) {
    env.storage()
        .persistent()
        .set(&DataKey::Source(source.clone()), stats);
}
