#![no_std]

use shared::constants::FIRST_CLAIM_RIGHT_ID;
use shared::errors::Error;
use shared::events::{CLAIM_RIGHT_BURNED, CLAIM_RIGHT_MINTED, CLAIM_RIGHT_MOVED};
use shared::interfaces::ProtocolConfigClient;
use shared::types::{ClaimRight, PoolType};
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env, Vec};


/// Storage keys for the claim-right registry
#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    /// Protocol configuration contract address
    Config,
    /// Next id to assign
    NextId,
    /// Claim-right record keyed by id
    Right(u64),
    /// Ids currently owned by an address
    OwnerIds(Address),
}

#[contract]
pub struct ClaimRightsContract;

#[contractimpl]
impl ClaimRightsContract {
    /// Initialize the registry with the protocol configuration address.
    /// Only the protocol admin may wire the registry, so the configuration
    /// contract must be initialized first.
    pub fn initialize(env: Env, protocol_config: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Config) {
            return Err(Error::AlreadyInit);
        }
        let admin = ProtocolConfigClient::new(&env, &protocol_config).admin_address();
        admin.require_auth();

        env.storage().instance().set(&DataKey::Config, &protocol_config);
        env.storage()
            .instance()
            .set(&DataKey::NextId, &FIRST_CLAIM_RIGHT_ID);
        Ok(())
    }

    /// Mint a claim-right for `owner`, issued by `issuing_pool`.
    ///
    /// Only a pool registered in the protocol configuration for the given
    /// type may mint. Ids are assigned monotonically starting at 1.
    ///
    /// # Errors
    /// * `InvalidPool` - Issuing pool is not registered for `pool_type`
    pub fn mint(
        env: Env,
        issuing_pool: Address,
        pool_type: PoolType,
        owner: Address,
    ) -> Result<u64, Error> {
        issuing_pool.require_auth();

        let config = get_config(&env)?;
        let config_client = ProtocolConfigClient::new(&env, &config);
        let registered = match pool_type {
            PoolType::Individual => config_client.is_valid_individual_pool(&issuing_pool),
            PoolType::Aggregate => config_client.is_valid_aggregate_pool(&issuing_pool),
        };
        if !registered {
            return Err(Error::InvalidPool);
        }

        let id: u64 = env
            .storage()
            .instance()
            .get(&DataKey::NextId)
            .ok_or(Error::NotInit)?;
        let next = id.checked_add(1).ok_or(Error::Overflow)?;
        env.storage().instance().set(&DataKey::NextId, &next);

        let right = ClaimRight {
            id,
            issuing_pool: issuing_pool.clone(),
            pool_type,
            owner: owner.clone(),
        };
        env.storage().persistent().set(&DataKey::Right(id), &right);

        let mut ids = get_owner_ids(&env, &owner);
        ids.push_back(id);
        env.storage()
            .persistent()
            .set(&DataKey::OwnerIds(owner.clone()), &ids);

        env.events()
            .publish((CLAIM_RIGHT_MINTED, owner), (id, issuing_pool));

        Ok(id)
    }

    /// Burn a claim-right. The record is deleted entirely; a later `owner_of`
    /// on the same id fails with `NotFound`.
    ///
    /// # Errors
    /// * `NotFound` - Id was never minted or already burned
    /// * `Unauthorized` - Caller is neither the owner nor the issuing pool
    pub fn burn(env: Env, id: u64, caller: Address) -> Result<(), Error> {
        caller.require_auth();

        let right = get_right(&env, id)?;
        if caller != right.owner && caller != right.issuing_pool {
            return Err(Error::Unauthorized);
        }

        env.storage().persistent().remove(&DataKey::Right(id));
        remove_owner_id(&env, &right.owner, id);

        env.events()
            .publish((CLAIM_RIGHT_BURNED, right.owner), id);

        Ok(())
    }

    /// Transfer ownership of a claim-right. The issuing pool and pool type
    /// stay with the record; only the payout entitlement changes hands.
    pub fn transfer(env: Env, id: u64, from: Address, to: Address) -> Result<(), Error> {
        from.require_auth();

        let mut right = get_right(&env, id)?;
        if right.owner != from {
            return Err(Error::NotOwner);
        }

        remove_owner_id(&env, &from, id);
        let mut to_ids = get_owner_ids(&env, &to);
        to_ids.push_back(id);
        env.storage()
            .persistent()
            .set(&DataKey::OwnerIds(to.clone()), &to_ids);

        right.owner = to.clone();
        env.storage().persistent().set(&DataKey::Right(id), &right);

        env.events().publish((CLAIM_RIGHT_MOVED, from), (id, to));

        Ok(())
    }

    /// Current owner of a claim-right
    pub fn owner_of(env: Env, id: u64) -> Result<Address, Error> {
        Ok(get_right(&env, id)?.owner)
    }

    /// Full claim-right record
    pub fn get_right(env: Env, id: u64) -> Result<ClaimRight, Error> {
        get_right(&env, id)
    }

    /// All ids owned by `owner`
    pub fn list_by_owner(env: Env, owner: Address) -> Vec<u64> {
        get_owner_ids(&env, &owner)
    }

    /// Ids owned by `owner` that were issued by `pool` with `pool_type`
    pub fn list_by_owner_and_pool(
        env: Env,
        owner: Address,
        pool: Address,
        pool_type: PoolType,
    ) -> Vec<u64> {
        let mut matching = Vec::new(&env);
        for id in get_owner_ids(&env, &owner).iter() {
            if let Ok(right) = get_right(&env, id) {
                if right.issuing_pool == pool && right.pool_type == pool_type {
                    matching.push_back(id);
                }
            }
        }
        matching
    }
}

fn get_config(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInit)
}

fn get_right(env: &Env, id: u64) -> Result<ClaimRight, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Right(id))
        .ok_or(Error::NotFound)
}

fn get_owner_ids(env: &Env, owner: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::OwnerIds(owner.clone()))
        .unwrap_or(Vec::new(env))
}

fn remove_owner_id(env: &Env, owner: &Address, id: u64) {
    let mut ids = get_owner_ids(env, owner);
    if let Some(index) = ids.first_index_of(id) {
        ids.remove(index);
        env.storage()
            .persistent()
            .set(&DataKey::OwnerIds(owner.clone()), &ids);
    }
}
