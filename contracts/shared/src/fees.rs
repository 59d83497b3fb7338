use crate::errors::Error;
use crate::types::Amount;

/// Split `amount` into `(fee, remainder)` at `take_rate / precision`.
///
/// `fee = floor(amount * take_rate / precision)`; the remainder absorbs the
/// rounding so `fee + remainder == amount` holds for every input. Bounds on
/// `take_rate` vs `precision` are the protocol configuration's job, not ours.
pub fn apply_fee(amount: Amount, take_rate: i128, precision: i128) -> Result<(Amount, Amount), Error> {
    if amount < 0 || take_rate < 0 || precision <= 0 {
        return Err(Error::InvalidAmount);
    }
    let fee = amount
        .checked_mul(take_rate)
        .ok_or(Error::Overflow)?
        / precision;
    Ok((fee, amount - fee))
}
