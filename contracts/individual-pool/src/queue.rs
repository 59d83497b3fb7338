//! Storage-backed FIFO of undeployed investment entries.
//!
//! Deployment drains head-first, but an investor pulling undeployed capital
//! back out must be O(1), so removal punches a hole instead of compacting the
//! slot range. The head pointer advances lazily over holes. Invariant: the
//! stored running total equals the sum of all live entries in `[first, last]`.

use shared::errors::Error;
use shared::types::Amount;
use soroban_sdk::{contracttype, Env};

use crate::storage::DataKey;

/// One pending investment, keyed by the claim-right id that backs it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueueEntry {
    pub key: u64,
    pub amount: Amount,
    pub created_at: u64,
}

fn first(env: &Env) -> u64 {
    env.storage().instance().get(&DataKey::QueueFirst).unwrap_or(1)
}

fn last(env: &Env) -> u64 {
    env.storage().instance().get(&DataKey::QueueLast).unwrap_or(0)
}

fn set_first(env: &Env, value: u64) {
    env.storage().instance().set(&DataKey::QueueFirst, &value);
}

fn set_last(env: &Env, value: u64) {
    env.storage().instance().set(&DataKey::QueueLast, &value);
}

fn get_entry(env: &Env, slot: u64) -> Option<QueueEntry> {
    env.storage().persistent().get(&DataKey::QueueEntry(slot))
}

fn set_entry(env: &Env, slot: u64, entry: &QueueEntry) {
    env.storage().persistent().set(&DataKey::QueueEntry(slot), entry);
}

fn set_total(env: &Env, value: Amount) {
    env.storage().instance().set(&DataKey::QueueTotal, &value);
}

/// Running total of all live entries
pub fn total(env: &Env) -> Amount {
    env.storage().instance().get(&DataKey::QueueTotal).unwrap_or(0)
}

pub fn is_empty(env: &Env) -> bool {
    head_slot(env).is_none()
}

/// Slot of the first live entry, skipping holes left by out-of-order removal.
/// Persists the advanced head pointer so the skip is paid once.
fn head_slot(env: &Env) -> Option<u64> {
    let mut slot = first(env);
    let last = last(env);
    let start = slot;
    while slot <= last && get_entry(env, slot).is_none() {
        slot += 1;
    }
    if slot != start {
        set_first(env, slot);
    }
    if slot > last {
        None
    } else {
        Some(slot)
    }
}

/// Append an entry at the tail.
///
/// # Errors
/// * `InvalidAmount` - `amount` is zero or negative
pub fn enqueue(env: &Env, key: u64, amount: Amount, created_at: u64) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let slot = last(env).checked_add(1).ok_or(Error::Overflow)?;
    set_entry(env, slot, &QueueEntry { key, amount, created_at });
    env.storage().persistent().set(&DataKey::QueuePosition(key), &slot);
    set_last(env, slot);
    let new_total = total(env).checked_add(amount).ok_or(Error::Overflow)?;
    set_total(env, new_total);
    Ok(())
}

/// Head entry without removing it.
pub fn peek(env: &Env) -> Result<QueueEntry, Error> {
    let slot = head_slot(env).ok_or(Error::EmptyQueue)?;
    get_entry(env, slot).ok_or(Error::EmptyQueue)
}

/// Remove and return the head entry.
pub fn dequeue(env: &Env) -> Result<QueueEntry, Error> {
    let slot = head_slot(env).ok_or(Error::EmptyQueue)?;
    let entry = get_entry(env, slot).ok_or(Error::EmptyQueue)?;
    env.storage().persistent().remove(&DataKey::QueueEntry(slot));
    env.storage()
        .persistent()
        .remove(&DataKey::QueuePosition(entry.key));
    set_first(env, slot + 1);
    set_total(env, total(env) - entry.amount);
    Ok(entry)
}

/// Subtract `amount` from the head entry without removing it. The head must
/// strictly survive the decrement; a whole-entry drain goes through `dequeue`.
///
/// # Errors
/// * `EmptyQueue` - No live entries
/// * `InvalidAmount` - `amount` is not in `(0, head.amount)`
pub fn decrement_head(env: &Env, amount: Amount) -> Result<(), Error> {
    let slot = head_slot(env).ok_or(Error::EmptyQueue)?;
    let mut entry = get_entry(env, slot).ok_or(Error::EmptyQueue)?;
    if amount <= 0 || amount >= entry.amount {
        return Err(Error::InvalidAmount);
    }
    entry.amount -= amount;
    set_entry(env, slot, &entry);
    set_total(env, total(env) - amount);
    Ok(())
}

/// Remove the entry backing `key`, wherever it sits in the range. Removing the
/// head delegates to `dequeue`; anywhere else leaves a hole for the head
/// pointer to skip later.
///
/// # Errors
/// * `NotFound` - `key` is unmapped or its entry was already deleted
pub fn remove_by_key(env: &Env, key: u64) -> Result<QueueEntry, Error> {
    let slot: u64 = env
        .storage()
        .persistent()
        .get(&DataKey::QueuePosition(key))
        .ok_or(Error::NotFound)?;
    let entry = get_entry(env, slot).ok_or(Error::NotFound)?;
    if head_slot(env) == Some(slot) {
        return dequeue(env);
    }
    env.storage().persistent().remove(&DataKey::QueueEntry(slot));
    env.storage().persistent().remove(&DataKey::QueuePosition(key));
    set_total(env, total(env) - entry.amount);
    Ok(entry)
}

/// Amount still queued under `key`, 0 when the entry is gone.
pub fn amount_of_key(env: &Env, key: u64) -> Amount {
    let slot: Option<u64> = env.storage().persistent().get(&DataKey::QueuePosition(key));
    match slot {
        Some(slot) => get_entry(env, slot).map(|e| e.amount).unwrap_or(0),
        None => 0,
    }
}
