//! Cost model for ranking market candidates.

use alloy_primitives::U256;

use super::QueryResponse;

/// attoFIL per FIL.
const ATTO_PER_FIL: u64 = 1_000_000_000_000_000_000;

/// Total price of a full retrieval: `size * price_per_byte + unseal_price`.
///
/// Saturates at `U256::MAX` instead of wrapping.
pub fn total_cost(response: &QueryResponse) -> U256 {
    U256::from(response.size)
        .saturating_mul(response.min_price_per_byte)
        .saturating_add(response.unseal_price)
}

/// Format an attoFIL amount as FIL, e.g. `1.5 FIL` or `0 FIL`.
pub fn format_fil(amount: U256) -> String {
    let unit = U256::from(ATTO_PER_FIL);
    let whole = amount / unit;
    let fraction = amount % unit;

    if fraction.is_zero() {
        return format!("{} FIL", whole);
    }

    // fraction < 10^18, so the low limb holds it exactly
    let digits = format!("{:018}", fraction.as_limbs()[0]);
    format!("{}.{} FIL", whole, digits.trim_end_matches('0'))
}
