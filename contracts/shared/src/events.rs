use soroban_sdk::{symbol_short, Symbol};

// Claim-right registry
pub const CLAIM_RIGHT_MINTED: Symbol = symbol_short!("cr_mint");
pub const CLAIM_RIGHT_BURNED: Symbol = symbol_short!("cr_burn");
pub const CLAIM_RIGHT_MOVED: Symbol = symbol_short!("cr_xfer");

// Pool ledgers
pub const INVESTED: Symbol = symbol_short!("invested");
pub const WITHDRAWN: Symbol = symbol_short!("withdrawn");
pub const CONTRIBUTED: Symbol = symbol_short!("contrib");
pub const DIVIDENDS_CLAIMED: Symbol = symbol_short!("claimed");
pub const UNDEPLOYED_REMOVED: Symbol = symbol_short!("undep_rm");
pub const ALLOCATIONS_SET: Symbol = symbol_short!("alloc_set");

// Protocol configuration
pub const POOL_REGISTERED: Symbol = symbol_short!("pool_reg");
pub const POOL_DEREGISTERED: Symbol = symbol_short!("pool_dreg");
pub const TAKE_RATE_SET: Symbol = symbol_short!("rate_set");
pub const TREASURY_SET: Symbol = symbol_short!("treas_set");
