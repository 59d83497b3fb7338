#![no_std]

use shared::constants::BPS_DENOMINATOR;
use shared::errors::Error;
use shared::events::{CONTRIBUTED, DIVIDENDS_CLAIMED, INVESTED, UNDEPLOYED_REMOVED, WITHDRAWN};
use shared::fees::apply_fee;
use shared::interfaces::{ClaimRightsClient, ProtocolConfigClient};
use shared::types::{Amount, ClaimRightStats, PoolType, SourceStats};
use soroban_sdk::{contract, contractimpl, token::TokenClient, Address, Env, Vec};

pub mod queue;
mod storage;


use storage::*;

#[contract]
pub struct IndividualPoolContract;

#[contractimpl]
impl IndividualPoolContract {
    /// Initialize the pool ledger.
    ///
    /// # Arguments
    /// * `token` - Value unit this pool accounts in
    /// * `recipient` - The party entitled to draw down and contribute back
    /// * `recipient_max_balance` - Cap on the recipient's outstanding balance
    /// * `max_investment` - Cap per single investment, 0 to disable
    /// * `claim_rights` - Claim-right registry contract
    /// * `protocol_config` - Protocol configuration contract
    pub fn initialize(
        env: Env,
        token: Address,
        recipient: Address,
        recipient_max_balance: Amount,
        max_investment: Amount,
        claim_rights: Address,
        protocol_config: Address,
    ) -> Result<(), Error> {
        if has_config(&env) {
            return Err(Error::AlreadyInit);
        }
        if recipient_max_balance <= 0 || max_investment < 0 {
            return Err(Error::InvalidAmount);
        }
        set_config(
            &env,
            &PoolConfig {
                token,
                recipient,
                recipient_max_balance,
                max_investment,
                claim_rights,
                protocol_config,
            },
        );
        Ok(())
    }

    /// Invest directly into this pool. Mints an Individual claim-right for the
    /// investor, pulls the tokens in, and queues the capital for deployment.
    ///
    /// # Errors
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `LimitExceeded` - `amount` exceeds the per-investment cap
    /// * `InsufficientBalance` - Investor's token balance is short
    pub fn invest(env: Env, investor: Address, amount: Amount) -> Result<u64, Error> {
        investor.require_auth();
        let config = get_config(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if config.max_investment > 0 && amount > config.max_investment {
            return Err(Error::LimitExceeded);
        }

        let token = TokenClient::new(&env, &config.token);
        if token.balance(&investor) < amount {
            return Err(Error::InsufficientBalance);
        }

        let registry = ClaimRightsClient::new(&env, &config.claim_rights);
        let claim_id = registry.mint(
            &env.current_contract_address(),
            &PoolType::Individual,
            &investor,
        );

        token.transfer(&investor, &env.current_contract_address(), &amount);
        enter_queue(&env, claim_id, amount, &investor)?;

        env.events()
            .publish((INVESTED, investor), (claim_id, amount));

        Ok(claim_id)
    }

    /// Invest on behalf of an aggregate pool that already holds the capital
    /// and the claim-right. No tokens move here; the caller transferred its
    /// sub-amount before this call.
    ///
    /// # Errors
    /// * `InvalidPool` - Caller is not a registered aggregate pool
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `LimitExceeded` - `amount` exceeds the per-investment cap
    pub fn invest_for(
        env: Env,
        caller_pool: Address,
        claim_right_id: u64,
        amount: Amount,
    ) -> Result<(), Error> {
        caller_pool.require_auth();
        let config = get_config(&env)?;
        require_aggregate_pool(&env, &config, &caller_pool)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        // The cap binds routed sub-investments the same as direct ones.
        if config.max_investment > 0 && amount > config.max_investment {
            return Err(Error::LimitExceeded);
        }

        enter_queue(&env, claim_right_id, amount, &caller_pool)?;

        env.events()
            .publish((INVESTED, caller_pool), (claim_right_id, amount));

        Ok(())
    }

    /// Draw down undeployed capital. Recipient only. Drains the deployment
    /// queue head-first, moving exactly `amount` from undeployed to deployed
    /// bookkeeping, then transfers the tokens out.
    ///
    /// # Errors
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `LimitExceeded` - Would push the recipient past the balance cap
    /// * `InsufficientUndeployed` - More than the queue holds
    /// * `InsufficientBalance` - The pool's token holdings are short
    pub fn withdraw(env: Env, amount: Amount) -> Result<(), Error> {
        let config = get_config(&env)?;
        config.recipient.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let balance = get_recipient_balance(&env);
        let new_balance = balance.checked_add(amount).ok_or(Error::Overflow)?;
        if new_balance > config.recipient_max_balance {
            return Err(Error::LimitExceeded);
        }
        if amount > queue::total(&env) {
            return Err(Error::InsufficientUndeployed);
        }

        let token = TokenClient::new(&env, &config.token);
        if token.balance(&env.current_contract_address()) < amount {
            return Err(Error::InsufficientBalance);
        }

        let mut remaining = amount;
        while remaining > 0 {
            let head = queue::peek(&env)?;
            if head.amount <= remaining {
                queue::dequeue(&env)?;
                deploy_capital(&env, head.key, head.amount)?;
                remaining -= head.amount;
            } else {
                queue::decrement_head(&env, remaining)?;
                deploy_capital(&env, head.key, remaining)?;
                remaining = 0;
            }
        }

        let total = get_total_deployed(&env)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        set_total_deployed(&env, total);
        set_recipient_balance(&env, new_balance);
        record_first_withdrawal(&env, env.ledger().timestamp());

        token.transfer(&env.current_contract_address(), &config.recipient, &amount);

        env.events().publish((WITHDRAWN, config.recipient), amount);

        Ok(())
    }

    /// Return value to the pool. Recipient only. The protocol fee is split off
    /// to the treasury; the remainder is distributed pro-rata across live
    /// claim-rights by their share of deployed capital. Sub-unit residue from
    /// the floor division stays in the pool. The recipient's outstanding
    /// balance drops by the gross amount, floored at zero.
    ///
    /// # Errors
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `NoDeployedCapital` - Nothing has been drawn down yet
    /// * `InsufficientBalance` - Recipient's token balance is short
    pub fn contribute(env: Env, amount: Amount) -> Result<(), Error> {
        let config = get_config(&env)?;
        config.recipient.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let total_deployed = get_total_deployed(&env);
        if total_deployed == 0 {
            return Err(Error::NoDeployedCapital);
        }

        let token = TokenClient::new(&env, &config.token);
        if token.balance(&config.recipient) < amount {
            return Err(Error::InsufficientBalance);
        }

        let protocol = ProtocolConfigClient::new(&env, &config.protocol_config);
        let take_rate = protocol.protocol_take_rate();
        let precision = protocol.take_rate_precision();
        let (fee, remainder) = apply_fee(amount, take_rate, precision)?;

        token.transfer(&config.recipient, &env.current_contract_address(), &amount);
        if fee > 0 {
            let treasury = protocol.treasury_address();
            token.transfer(&env.current_contract_address(), &treasury, &fee);
        }

        distribute_dividends(&env, remainder, total_deployed)?;

        let cumulative = get_cumulative_dividends(&env)
            .checked_add(remainder)
            .ok_or(Error::Overflow)?;
        set_cumulative_dividends(&env, cumulative);

        // Contributions beyond the outstanding balance are forgiven.
        let balance = get_recipient_balance(&env);
        set_recipient_balance(&env, (balance - amount).max(0));

        env.events()
            .publish((CONTRIBUTED, config.recipient), (amount, fee, remainder));

        Ok(())
    }

    /// Pay out every unclaimed dividend owed to `investor` through claim-rights
    /// this pool issued. A repeat call with nothing new accrued pays 0.
    ///
    /// # Errors
    /// * `NotFound` - Investor holds no claim-rights issued by this pool
    /// * `InsufficientBalance` - The pool's token holdings can't cover it
    pub fn claim(env: Env, investor: Address) -> Result<Amount, Error> {
        investor.require_auth();
        let config = get_config(&env)?;

        let registry = ClaimRightsClient::new(&env, &config.claim_rights);
        let ids = registry.list_by_owner_and_pool(
            &investor,
            &env.current_contract_address(),
            &PoolType::Individual,
        );
        if ids.is_empty() {
            return Err(Error::NotFound);
        }

        let payout = settle_unclaimed(&env, &config, &investor, &ids)?;

        env.events().publish((DIVIDENDS_CLAIMED, investor), payout);

        Ok(payout)
    }

    /// Claim relay for an aggregate pool fanning out on behalf of an investor.
    /// The entitlement is recomputed from this pool's own books and ownership
    /// is checked against the registry; a caller-supplied amount is never
    /// trusted.
    ///
    /// # Errors
    /// * `InvalidPool` - Caller is not a registered aggregate pool
    /// * `NotOwner` - A listed claim-right is not owned by `investor`
    /// * `Unauthorized` - A listed claim-right was not issued by the caller
    pub fn claim_for(
        env: Env,
        caller_pool: Address,
        investor: Address,
        claim_right_ids: Vec<u64>,
    ) -> Result<Amount, Error> {
        caller_pool.require_auth();
        let config = get_config(&env)?;
        require_aggregate_pool(&env, &config, &caller_pool)?;

        let registry = ClaimRightsClient::new(&env, &config.claim_rights);
        for id in claim_right_ids.iter() {
            let right = registry.get_right(&id);
            if right.owner != investor {
                return Err(Error::NotOwner);
            }
            if right.issuing_pool != caller_pool {
                return Err(Error::Unauthorized);
            }
        }

        let payout = settle_unclaimed(&env, &config, &investor, &claim_right_ids)?;

        env.events().publish((DIVIDENDS_CLAIMED, investor), payout);

        Ok(payout)
    }

    /// Pull a still-undeployed investment back out of the queue. Owner only.
    /// The claim-right is burned when no deployed capital remains behind it.
    ///
    /// # Errors
    /// * `NotOwner` - Caller does not own the claim-right
    /// * `NotFound` - The claim-right was not issued by this pool
    /// * `NotInQueue` - The capital was already deployed
    pub fn remove_undeployed(env: Env, caller: Address, claim_right_id: u64) -> Result<Amount, Error> {
        caller.require_auth();
        let config = get_config(&env)?;

        let registry = ClaimRightsClient::new(&env, &config.claim_rights);
        let right = registry.get_right(&claim_right_id);
        if right.owner != caller {
            return Err(Error::NotOwner);
        }
        if right.issuing_pool != env.current_contract_address() {
            return Err(Error::NotFound);
        }

        let removed = withdraw_queued(&env, claim_right_id, &caller)?;

        let position = get_position(&env, claim_right_id)?;
        if position.deployed == 0 {
            remove_position(&env, claim_right_id);
            remove_active_claim(&env, claim_right_id);
            registry.burn(&claim_right_id, &env.current_contract_address());
        }

        env.events()
            .publish((UNDEPLOYED_REMOVED, caller), (claim_right_id, removed));

        Ok(removed)
    }

    /// Removal relay for an aggregate pool. Returns 0 when this pool holds no
    /// queue entry for the id, so the caller can fan out blindly. Burning is
    /// the caller's decision; only it can see the whole hierarchy.
    pub fn remove_undeployed_for(
        env: Env,
        caller_pool: Address,
        claim_right_id: u64,
        investor: Address,
    ) -> Result<Amount, Error> {
        caller_pool.require_auth();
        let config = get_config(&env)?;
        require_aggregate_pool(&env, &config, &caller_pool)?;

        let registry = ClaimRightsClient::new(&env, &config.claim_rights);
        let right = registry.get_right(&claim_right_id);
        if right.owner != investor {
            return Err(Error::NotOwner);
        }
        if right.issuing_pool != caller_pool {
            return Err(Error::Unauthorized);
        }

        if queue::amount_of_key(&env, claim_right_id) == 0 {
            return Ok(0);
        }

        let removed = withdraw_queued(&env, claim_right_id, &investor)?;

        let position = get_position(&env, claim_right_id)?;
        if position.deployed == 0 {
            remove_position(&env, claim_right_id);
            remove_active_claim(&env, claim_right_id);
        }

        env.events()
            .publish((UNDEPLOYED_REMOVED, investor), (claim_right_id, removed));

        Ok(removed)
    }

    // ==================== Read-only getters ====================

    /// Capital waiting in the deployment queue
    pub fn undeployed_amount(env: Env) -> Amount {
        queue::total(&env)
    }

    /// Capital drawn down by the recipient, cumulative
    pub fn deployed_amount(env: Env) -> Amount {
        get_total_deployed(&env)
    }

    pub fn cumulative_dividends(env: Env) -> Amount {
        get_cumulative_dividends(&env)
    }

    pub fn recipient_balance(env: Env) -> Amount {
        get_recipient_balance(&env)
    }

    pub fn first_withdrawal_at(env: Env) -> Option<u64> {
        get_first_withdrawal_at(&env)
    }

    pub fn queue_is_empty(env: Env) -> bool {
        queue::is_empty(&env)
    }

    pub fn pool_token(env: Env) -> Result<Address, Error> {
        Ok(get_config(&env)?.token)
    }

    /// Cumulative return in basis points: dividends realized per unit of
    /// capital ever deployed. 0 while nothing has been deployed.
    pub fn cumulative_return_bps(env: Env) -> Amount {
        let deployed = get_total_deployed(&env);
        if deployed == 0 {
            return 0;
        }
        BPS_DENOMINATOR * get_cumulative_dividends(&env) / deployed
    }

    /// Ledger slice for one claim-right; zeros when this pool never saw it.
    pub fn claim_right_stats(env: Env, id: u64) -> ClaimRightStats {
        let undeployed = queue::amount_of_key(&env, id);
        match get_position(&env, id) {
            Ok(position) => ClaimRightStats {
                deployed: position.deployed,
                undeployed,
                unclaimed_dividends: position.unclaimed,
                total_dividends: position.total_dividends,
            },
            Err(_) => ClaimRightStats {
                deployed: 0,
                undeployed,
                unclaimed_dividends: 0,
                total_dividends: 0,
            },
        }
    }

    /// Totals for one source (direct investor or aggregate pool)
    pub fn source_stats(env: Env, source: Address) -> SourceStats {
        get_source_stats(&env, &source)
    }

    /// Cumulative dividends paid out to an investor
    pub fn claimed_total_of(env: Env, investor: Address) -> Amount {
        get_claimed_total(&env, &investor)
    }
}

// ==================== Internal helpers ====================

fn require_aggregate_pool(env: &Env, config: &PoolConfig, caller: &Address) -> Result<(), Error> {
    let protocol = ProtocolConfigClient::new(env, &config.protocol_config);
    if !protocol.is_valid_aggregate_pool(caller) {
        return Err(Error::InvalidPool);
    }
    Ok(())
}

/// Enqueue new capital and open its ledger position.
fn enter_queue(env: &Env, claim_id: u64, amount: Amount, source: &Address) -> Result<(), Error> {
    queue::enqueue(env, claim_id, amount, env.ledger().timestamp())?;
    set_position(
        env,
        claim_id,
        &Position {
            source: source.clone(),
            deployed: 0,
            unclaimed: 0,
            total_dividends: 0,
        },
    );
    add_active_claim(env, claim_id);

    let mut stats = get_source_stats(env, source);
    stats.undeployed = stats.undeployed.checked_add(amount).ok_or(Error::Overflow)?;
    set_source_stats(env, source, &stats);
    Ok(())
}

/// Move `amount` of a claim-right's capital from undeployed to deployed.
fn deploy_capital(env: &Env, claim_id: u64, amount: Amount) -> Result<(), Error> {
    let mut position = get_position(env, claim_id)?;
    position.deployed = position.deployed.checked_add(amount).ok_or(Error::Overflow)?;
    let source = position.source.clone();
    set_position(env, claim_id, &position);

    let mut stats = get_source_stats(env, &source);
    stats.deployed = stats.deployed.checked_add(amount).ok_or(Error::Overflow)?;
    stats.undeployed -= amount;
    set_source_stats(env, &source, &stats);
    Ok(())
}

/// Credit `remainder` across live claim-rights pro-rata by deployed share.
fn distribute_dividends(env: &Env, remainder: Amount, total_deployed: Amount) -> Result<(), Error> {
    for id in get_active_claims(env).iter() {
        let mut position = get_position(env, id)?;
        if position.deployed == 0 {
            continue;
        }
        let share = remainder
            .checked_mul(position.deployed)
            .ok_or(Error::Overflow)?
            / total_deployed;
        if share == 0 {
            continue;
        }
        position.unclaimed = position.unclaimed.checked_add(share).ok_or(Error::Overflow)?;
        position.total_dividends = position
            .total_dividends
            .checked_add(share)
            .ok_or(Error::Overflow)?;
        let source = position.source.clone();
        set_position(env, id, &position);

        let mut stats = get_source_stats(env, &source);
        stats.total_dividends = stats
            .total_dividends
            .checked_add(share)
            .ok_or(Error::Overflow)?;
        set_source_stats(env, &source, &stats);
    }
    Ok(())
}

/// Zero out the unclaimed entitlement on `ids` and pay the sum to `investor`.
fn settle_unclaimed(
    env: &Env,
    config: &PoolConfig,
    investor: &Address,
    ids: &Vec<u64>,
) -> Result<Amount, Error> {
    let mut payout: Amount = 0;
    for id in ids.iter() {
        if let Ok(position) = get_position(env, id) {
            payout = payout.checked_add(position.unclaimed).ok_or(Error::Overflow)?;
        }
    }

    let token = TokenClient::new(env, &config.token);
    if payout > token.balance(&env.current_contract_address()) {
        return Err(Error::InsufficientBalance);
    }

    if payout > 0 {
        for id in ids.iter() {
            if let Ok(mut position) = get_position(env, id) {
                position.unclaimed = 0;
                set_position(env, id, &position);
            }
        }
        let claimed = get_claimed_total(env, investor)
            .checked_add(payout)
            .ok_or(Error::Overflow)?;
        set_claimed_total(env, investor, claimed);
        token.transfer(&env.current_contract_address(), investor, &payout);
    }

    Ok(payout)
}

/// Remove a queue entry and hand the capital back.
fn withdraw_queued(env: &Env, claim_id: u64, beneficiary: &Address) -> Result<Amount, Error> {
    let entry = match queue::remove_by_key(env, claim_id) {
        Ok(entry) => entry,
        Err(Error::NotFound) => return Err(Error::NotInQueue),
        Err(e) => return Err(e),
    };

    let position = get_position(env, claim_id)?;
    let mut stats = get_source_stats(env, &position.source);
    stats.undeployed -= entry.amount;
    set_source_stats(env, &position.source, &stats);

    let config = get_config(env)?;
    let token = TokenClient::new(env, &config.token);
    token.transfer(&env.current_contract_address(), beneficiary, &entry.amount);

    Ok(entry.amount)
}
