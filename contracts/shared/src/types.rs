use soroban_sdk::{contracttype, Address};

/// Token amounts throughout the ledger. Non-negative by invariant; i128 to
/// match the Stellar Asset Contract interface.
pub type Amount = i128;

/// Which tier of the pool hierarchy issued a claim-right.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum PoolType {
    Individual = 0,
    Aggregate = 1,
}

/// One investment event. `issuing_pool` and `pool_type` never change after
/// mint; only `owner` moves on transfer.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimRight {
    pub id: u64,
    pub issuing_pool: Address,
    pub pool_type: PoolType,
    pub owner: Address,
}

/// Per-claim-right ledger slice inside an individual pool, as seen by callers.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimRightStats {
    pub deployed: Amount,
    pub undeployed: Amount,
    pub unclaimed_dividends: Amount,
    pub total_dividends: Amount,
}

/// Per-source (direct investor or aggregate pool) totals inside an individual
/// pool. An aggregate pool's aggregated reads sum these across its children.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceStats {
    pub deployed: Amount,
    pub undeployed: Amount,
    pub total_dividends: Amount,
}
