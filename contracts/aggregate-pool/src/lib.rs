#![no_std]

use shared::constants::{ALLOCATION_MARGIN, ALLOCATION_TOTAL};
use shared::errors::Error;
use shared::events::{ALLOCATIONS_SET, DIVIDENDS_CLAIMED, INVESTED, UNDEPLOYED_REMOVED};
use shared::interfaces::{ClaimRightsClient, IndividualPoolClient, ProtocolConfigClient};
use shared::types::{Amount, ClaimRightStats, PoolType};
use soroban_sdk::{contract, contractimpl, token::TokenClient, Address, Env, Vec};

mod storage;

#[cfg(test)]
mod tests;

use storage::*;

#[contract]
pub struct AggregatePoolContract;

#[contractimpl]
impl AggregatePoolContract {
    /// Initialize the aggregate pool.
    ///
    /// # Arguments
    /// * `token` - Value unit; child pools must account in the same token
    /// * `manager` - The only party allowed to change allocations
    /// * `pool_investment_limit` - Cap on total routed capital, 0 to disable
    /// * `investor_investment_limit` - Per-investor cumulative cap, 0 to disable
    /// * `claim_rights` - Claim-right registry contract
    /// * `protocol_config` - Protocol configuration contract
    pub fn initialize(
        env: Env,
        token: Address,
        manager: Address,
        pool_investment_limit: Amount,
        investor_investment_limit: Amount,
        claim_rights: Address,
        protocol_config: Address,
    ) -> Result<(), Error> {
        if has_config(&env) {
            return Err(Error::AlreadyInit);
        }
        if pool_investment_limit < 0 || investor_investment_limit < 0 {
            return Err(Error::InvalidAmount);
        }
        set_config(
            &env,
            &PoolConfig {
                token,
                manager,
                pool_investment_limit,
                investor_investment_limit,
                claim_rights,
                protocol_config,
            },
        );
        Ok(())
    }

    /// Replace the allocation set. Manager only. Percentages are fixed-point
    /// with 100% == `ALLOCATION_TOTAL`; a shortfall or excess within
    /// `ALLOCATION_MARGIN` is corrected into the first pool of the list so the
    /// stored allocations sum to exactly 100%. Already-deployed capital is
    /// never moved; only new investments follow the new split.
    ///
    /// # Errors
    /// * `LengthMismatch` - `pools` and `percentages` differ in length
    /// * `EmptyInput` - No pools given
    /// * `InvalidPool` - A pool is unregistered, repeated in the list, or uses
    ///   a different token
    /// * `AllocationMismatch` - Sum is off by more than the margin, or the
    ///   correction would not leave the first pool a positive share
    pub fn set_allocations(
        env: Env,
        pools: Vec<Address>,
        percentages: Vec<Amount>,
    ) -> Result<(), Error> {
        let config = get_config(&env)?;
        config.manager.require_auth();

        if pools.len() != percentages.len() {
            return Err(Error::LengthMismatch);
        }
        if pools.is_empty() {
            return Err(Error::EmptyInput);
        }

        let protocol = ProtocolConfigClient::new(&env, &config.protocol_config);
        let mut sum: Amount = 0;
        let mut seen: Vec<Address> = Vec::new(&env);
        for (pool, percentage) in pools.iter().zip(percentages.iter()) {
            if percentage <= 0 {
                return Err(Error::InvalidAmount);
            }
            // The allocation set is a map; one entry per pool.
            if seen.contains(&pool) {
                return Err(Error::InvalidPool);
            }
            seen.push_back(pool.clone());
            if !protocol.is_valid_individual_pool(&pool) {
                return Err(Error::InvalidPool);
            }
            let child = IndividualPoolClient::new(&env, &pool);
            if child.pool_token() != config.token {
                return Err(Error::InvalidPool);
            }
            sum = sum.checked_add(percentage).ok_or(Error::Overflow)?;
        }

        let correction = ALLOCATION_TOTAL - sum;
        if correction.abs() > ALLOCATION_MARGIN {
            return Err(Error::AllocationMismatch);
        }
        // The first pool absorbs the correction; its share must stay positive.
        if percentages.get_unchecked(0) + correction <= 0 {
            return Err(Error::AllocationMismatch);
        }

        // Full replacement of the prior set.
        for pool in get_current_pools(&env).iter() {
            remove_allocation(&env, &pool);
        }
        for (index, (pool, percentage)) in pools.iter().zip(percentages.iter()).enumerate() {
            let stored = if index == 0 {
                // First pool absorbs the rounding difference.
                percentage + correction
            } else {
                percentage
            };
            set_allocation(&env, &pool, stored);
            remember_pool(&env, &pool);
        }
        set_current_pools(&env, &pools);

        env.events().publish((ALLOCATIONS_SET,), pools);

        Ok(())
    }

    /// Invest through the allocation set. Mints one Aggregate claim-right,
    /// pulls the full amount, then forwards `floor(allocation * amount / 100%)`
    /// to each child pool. Sub-unit dust from the floor split stays with this
    /// pool and is not redistributed.
    ///
    /// # Errors
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `EmptyInput` - No allocation set is live
    /// * `InsufficientBalance` - Investor's token balance is short
    /// * `PoolLimitExceeded` - Would push routed capital past the pool cap
    /// * `InvestorLimitExceeded` - Would push the investor past their cap
    pub fn invest(env: Env, investor: Address, amount: Amount) -> Result<u64, Error> {
        investor.require_auth();
        let config = get_config(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let pools = get_current_pools(&env);
        if pools.is_empty() {
            return Err(Error::EmptyInput);
        }

        let token = TokenClient::new(&env, &config.token);
        if token.balance(&investor) < amount {
            return Err(Error::InsufficientBalance);
        }

        if config.pool_investment_limit > 0 {
            let outstanding = Self::deployed_amount(env.clone())
                .checked_add(Self::undeployed_amount(env.clone()))
                .ok_or(Error::Overflow)?;
            if outstanding.checked_add(amount).ok_or(Error::Overflow)?
                > config.pool_investment_limit
            {
                return Err(Error::PoolLimitExceeded);
            }
        }
        let invested = get_investor_total(&env, &investor);
        if config.investor_investment_limit > 0
            && invested.checked_add(amount).ok_or(Error::Overflow)?
                > config.investor_investment_limit
        {
            return Err(Error::InvestorLimitExceeded);
        }

        let registry = ClaimRightsClient::new(&env, &config.claim_rights);
        let claim_id = registry.mint(
            &env.current_contract_address(),
            &PoolType::Aggregate,
            &investor,
        );

        token.transfer(&investor, &env.current_contract_address(), &amount);

        for pool in pools.iter() {
            let allocation = get_allocation(&env, &pool);
            let sub_amount = allocation
                .checked_mul(amount)
                .ok_or(Error::Overflow)?
                / ALLOCATION_TOTAL;
            if sub_amount > 0 {
                token.transfer(&env.current_contract_address(), &pool, &sub_amount);
                let child = IndividualPoolClient::new(&env, &pool);
                child.invest_for(&env.current_contract_address(), &claim_id, &sub_amount);
            }
        }

        set_investor_total(
            &env,
            &investor,
            invested.checked_add(amount).ok_or(Error::Overflow)?,
        );

        env.events().publish((INVESTED, investor), (claim_id, amount));

        Ok(claim_id)
    }

    /// Claim dividends across the whole hierarchy. Fans out to every child
    /// pool ever allocated — capital deployed under an old split is still owed
    /// to investors — and each child pays the investor directly from its own
    /// books. Returns the total paid; a repeat call with nothing new pays 0.
    ///
    /// # Errors
    /// * `NotFound` - Investor holds no claim-rights issued by this pool
    pub fn claim(env: Env, investor: Address) -> Result<Amount, Error> {
        investor.require_auth();
        let config = get_config(&env)?;

        let registry = ClaimRightsClient::new(&env, &config.claim_rights);
        let ids = registry.list_by_owner_and_pool(
            &investor,
            &env.current_contract_address(),
            &PoolType::Aggregate,
        );
        if ids.is_empty() {
            return Err(Error::NotFound);
        }

        let mut paid: Amount = 0;
        for pool in get_ever_pools(&env).iter() {
            let child = IndividualPoolClient::new(&env, &pool);
            let amount = child.claim_for(&env.current_contract_address(), &investor, &ids);
            paid = paid.checked_add(amount).ok_or(Error::Overflow)?;
        }

        env.events().publish((DIVIDENDS_CLAIMED, investor), paid);

        Ok(paid)
    }

    /// Pull a still-undeployed investment back out of every child pool. The
    /// claim-right is burned once no deployed capital remains anywhere behind
    /// it.
    ///
    /// # Errors
    /// * `NotOwner` - Caller does not own the claim-right
    /// * `NotFound` - The claim-right was not issued by this pool
    /// * `NotInQueue` - Nothing was left undeployed anywhere
    pub fn remove_undeployed(
        env: Env,
        investor: Address,
        claim_right_id: u64,
    ) -> Result<Amount, Error> {
        investor.require_auth();
        let config = get_config(&env)?;

        let registry = ClaimRightsClient::new(&env, &config.claim_rights);
        let right = registry.get_right(&claim_right_id);
        if right.owner != investor {
            return Err(Error::NotOwner);
        }
        if right.issuing_pool != env.current_contract_address() {
            return Err(Error::NotFound);
        }

        let mut removed: Amount = 0;
        let mut deployed_left: Amount = 0;
        for pool in get_ever_pools(&env).iter() {
            let child = IndividualPoolClient::new(&env, &pool);
            let amount = child.remove_undeployed_for(
                &env.current_contract_address(),
                &claim_right_id,
                &investor,
            );
            removed = removed.checked_add(amount).ok_or(Error::Overflow)?;
            deployed_left += child.claim_right_stats(&claim_right_id).deployed;
        }
        if removed == 0 {
            return Err(Error::NotInQueue);
        }

        let invested = get_investor_total(&env, &investor);
        set_investor_total(&env, &investor, (invested - removed).max(0));

        if deployed_left == 0 {
            registry.burn(&claim_right_id, &env.current_contract_address());
        }

        env.events()
            .publish((UNDEPLOYED_REMOVED, investor), (claim_right_id, removed));

        Ok(removed)
    }

    // ==================== Aggregated reads ====================
    //
    // Reads sum this pool's own slice across every child ever allocated, not
    // just the live set: capital deployed in a since-deallocated child is
    // still owed to investors.

    /// Capital this pool routed that recipients have drawn down
    pub fn deployed_amount(env: Env) -> Amount {
        let mut total: Amount = 0;
        for pool in get_ever_pools(&env).iter() {
            let child = IndividualPoolClient::new(&env, &pool);
            total += child.source_stats(&env.current_contract_address()).deployed;
        }
        total
    }

    /// Capital this pool routed that still waits in child queues
    pub fn undeployed_amount(env: Env) -> Amount {
        let mut total: Amount = 0;
        for pool in get_ever_pools(&env).iter() {
            let child = IndividualPoolClient::new(&env, &pool);
            total += child.source_stats(&env.current_contract_address()).undeployed;
        }
        total
    }

    /// Dividends realized on capital this pool routed, cumulative
    pub fn cumulative_dividends(env: Env) -> Amount {
        let mut total: Amount = 0;
        for pool in get_ever_pools(&env).iter() {
            let child = IndividualPoolClient::new(&env, &pool);
            total += child
                .source_stats(&env.current_contract_address())
                .total_dividends;
        }
        total
    }

    /// One claim-right's ledger slice summed across all children
    pub fn claim_right_stats(env: Env, id: u64) -> ClaimRightStats {
        let mut stats = ClaimRightStats {
            deployed: 0,
            undeployed: 0,
            unclaimed_dividends: 0,
            total_dividends: 0,
        };
        for pool in get_ever_pools(&env).iter() {
            let child = IndividualPoolClient::new(&env, &pool);
            let slice = child.claim_right_stats(&id);
            stats.deployed += slice.deployed;
            stats.undeployed += slice.undeployed;
            stats.unclaimed_dividends += slice.unclaimed_dividends;
            stats.total_dividends += slice.total_dividends;
        }
        stats
    }

    /// Live allocation percentage for a child pool, 0 when not allocated
    pub fn allocation_of(env: Env, pool: Address) -> Amount {
        get_allocation(&env, &pool)
    }

    pub fn current_pools(env: Env) -> Vec<Address> {
        get_current_pools(&env)
    }

    pub fn ever_pools(env: Env) -> Vec<Address> {
        get_ever_pools(&env)
    }

    /// Cumulative amount `investor` has invested through this pool
    pub fn invested_amount_of(env: Env, investor: Address) -> Amount {
        get_investor_total(&env, &investor)
    }

    pub fn pool_token(env: Env) -> Result<Address, Error> {
        Ok(get_config(&env)?.token)
    }
}
