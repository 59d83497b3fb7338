use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Error {
    AlreadyInit = 1,
    NotInit = 2,
    Unauthorized = 3,
    NotFound = 4,
    Overflow = 5,

    // Amount / balance errors
    InvalidAmount = 6,
    InsufficientBalance = 7,
    InsufficientUndeployed = 8,
    NoDeployedCapital = 9,

    // Queue errors
    EmptyQueue = 10,
    NotInQueue = 11,

    // Limit errors
    LimitExceeded = 12,
    PoolLimitExceeded = 13,
    InvestorLimitExceeded = 14,

    // Allocation errors
    AllocationMismatch = 15,
    LengthMismatch = 16,
    EmptyInput = 17,
    InvalidPool = 18,

    // Claim-right errors
    NotOwner = 19,
}
