/// Fixed-point units per 1% of allocation (1% == 10_000).
pub const PERCENT_PRECISION: i128 = 10_000;

/// 100% in allocation fixed-point units.
pub const ALLOCATION_TOTAL: i128 = 100 * PERCENT_PRECISION;

/// Largest tolerated |sum - 100%| when setting allocations. Anything within
/// this margin is corrected into the first pool of the list.
pub const ALLOCATION_MARGIN: i128 = 100;

/// Denominator for cumulative-return reads (basis points).
pub const BPS_DENOMINATOR: i128 = 10_000;

/// Claim-right ids are assigned starting from this value.
pub const FIRST_CLAIM_RIGHT_ID: u64 = 1;
