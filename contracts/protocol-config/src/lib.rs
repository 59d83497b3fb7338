#![no_std]

use shared::errors::Error;
use shared::events::{POOL_DEREGISTERED, POOL_REGISTERED, TAKE_RATE_SET, TREASURY_SET};
use shared::types::PoolType;
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env};


/// Storage keys for protocol configuration
#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    /// Admin address
    Admin,
    /// Treasury address receiving protocol fees
    Treasury,
    /// Take rate applied to contributions
    TakeRate,
    /// Fixed-point denominator for the take rate
    TakeRatePrecision,
    /// Registered pool flag keyed by address
    Pool(Address),
}

#[contract]
pub struct ProtocolConfigContract;

#[contractimpl]
impl ProtocolConfigContract {
    /// Initialize the protocol configuration.
    ///
    /// # Errors
    /// * `InvalidAmount` - `take_rate` is negative, `precision` is not
    ///   positive, or the rate exceeds the precision
    pub fn initialize(
        env: Env,
        admin: Address,
        treasury: Address,
        take_rate: i128,
        precision: i128,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInit);
        }
        admin.require_auth();

        if take_rate < 0 || precision <= 0 || take_rate > precision {
            return Err(Error::InvalidAmount);
        }

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Treasury, &treasury);
        env.storage().instance().set(&DataKey::TakeRate, &take_rate);
        env.storage()
            .instance()
            .set(&DataKey::TakeRatePrecision, &precision);
        Ok(())
    }

    /// Register a pool address as a live pool of the given type. Admin only.
    pub fn register_pool(env: Env, pool: Address, pool_type: PoolType) -> Result<(), Error> {
        require_admin(&env)?;
        env.storage()
            .persistent()
            .set(&DataKey::Pool(pool.clone()), &pool_type);
        env.events().publish((POOL_REGISTERED, pool), pool_type);
        Ok(())
    }

    /// Remove a pool from the registry. Admin only.
    pub fn deregister_pool(env: Env, pool: Address) -> Result<(), Error> {
        require_admin(&env)?;
        if !env.storage().persistent().has(&DataKey::Pool(pool.clone())) {
            return Err(Error::NotFound);
        }
        env.storage().persistent().remove(&DataKey::Pool(pool.clone()));
        env.events().publish((POOL_DEREGISTERED, pool), ());
        Ok(())
    }

    /// Update the protocol take rate. Admin only; the rate may never exceed
    /// the configured precision.
    pub fn set_take_rate(env: Env, take_rate: i128) -> Result<(), Error> {
        require_admin(&env)?;
        let precision: i128 = env
            .storage()
            .instance()
            .get(&DataKey::TakeRatePrecision)
            .ok_or(Error::NotInit)?;
        if take_rate < 0 || take_rate > precision {
            return Err(Error::InvalidAmount);
        }
        env.storage().instance().set(&DataKey::TakeRate, &take_rate);
        env.events().publish((TAKE_RATE_SET,), take_rate);
        Ok(())
    }

    /// Update the treasury address. Admin only.
    pub fn set_treasury(env: Env, treasury: Address) -> Result<(), Error> {
        require_admin(&env)?;
        env.storage().instance().set(&DataKey::Treasury, &treasury);
        env.events().publish((TREASURY_SET,), treasury);
        Ok(())
    }

    pub fn is_valid_individual_pool(env: Env, pool: Address) -> bool {
        pool_type_of(&env, &pool) == Some(PoolType::Individual)
    }

    pub fn is_valid_aggregate_pool(env: Env, pool: Address) -> bool {
        pool_type_of(&env, &pool) == Some(PoolType::Aggregate)
    }

    pub fn admin_address(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInit)
    }

    pub fn protocol_take_rate(env: Env) -> Result<i128, Error> {
        env.storage()
            .instance()
            .get(&DataKey::TakeRate)
            .ok_or(Error::NotInit)
    }

    pub fn take_rate_precision(env: Env) -> Result<i128, Error> {
        env.storage()
            .instance()
            .get(&DataKey::TakeRatePrecision)
            .ok_or(Error::NotInit)
    }

    pub fn treasury_address(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Treasury)
            .ok_or(Error::NotInit)
    }
}

fn require_admin(env: &Env) -> Result<(), Error> {
    let admin: Address = env
        .storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInit)?;
    admin.require_auth();
    Ok(())
}

fn pool_type_of(env: &Env, pool: &Address) -> Option<PoolType> {
    env.storage().persistent().get(&DataKey::Pool(pool.clone()))
}
