//! Native → USD conversion.
//!
//! Prices arrive with `FEED_DECIMALS` places and are lifted to
//! `NATIVE_DECIMALS` so that `price * amount / 10^NATIVE_DECIMALS` yields a
//! USD value with the same 18-decimal precision as the native currency.
//! All intermediates are 256-bit; division truncates toward zero.

use primitive_types::U256;

/// Decimal places of the smallest native-currency unit.
pub const NATIVE_DECIMALS: u32 = 18;

/// Decimal places of a USD price feed answer.
pub const FEED_DECIMALS: u32 = 8;

/// `10^NATIVE_DECIMALS`, i.e. one whole native unit (and one whole dollar).
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Lift a raw feed answer to native precision.
///
/// Returns `None` for zero or negative answers, which can never be a price.
pub fn feed_price(answer: i128) -> Option<U256> {
    if answer <= 0 {
        return None;
    }
    let scale = U256::exp10((NATIVE_DECIMALS - FEED_DECIMALS) as usize);
    U256::from(answer as u128).checked_mul(scale)
}

/// USD value (18 decimals) of `amount` smallest native units at `price`.
///
/// `None` only when `price * amount` exceeds 256 bits.
pub fn to_usd(amount: u128, price: U256) -> Option<U256> {
    let product = price.checked_mul(U256::from(amount))?;
    Some(product / U256::from(PRECISION))
}

/// Narrow a USD value back to the 128-bit `Balance` width.
pub fn to_u128(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.low_u128())
    }
}
