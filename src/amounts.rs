//! Big-integer amount normalization and executor-fee gross/net math.
//!
//! All on-chain amounts are unbounded integers; everything here works in [`U256`] rather
//! than any floating-point type, since the executor contract does the same.

use alloy_primitives::U256;

use crate::errors::ApiError;

/// Interprets a strategy- or request-supplied amount string as an unsigned integer.
///
/// - A fractional part (after `.`) is truncated, not rounded.
/// - A leading `-` clamps the result to zero rather than erroring — the strategy service
///   is untrusted input, and a negative quantity is simply not a sellable/buyable amount.
/// - An empty string normalizes to `"0"`.
/// - Anything else that doesn't parse as a decimal number is `INVALID_AMOUNT`.
pub fn normalize_uint(raw: &str) -> Result<U256, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(U256::ZERO);
    }

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let integer_part = match unsigned.split_once('.') {
        Some((whole, frac)) => {
            if whole.is_empty() && frac.is_empty() {
                return Err(ApiError::InvalidAmount(raw.to_string()));
            }
            whole
        }
        None => unsigned,
    };

    if negative {
        // Still validate the magnitude parses, so garbage input is rejected rather than
        // silently clamped.
        if integer_part.is_empty() {
            return Ok(U256::ZERO);
        }
        if !integer_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApiError::InvalidAmount(raw.to_string()));
        }
        return Ok(U256::ZERO);
    }

    if integer_part.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(integer_part, 10).map_err(|_| ApiError::InvalidAmount(raw.to_string()))
}

/// Clamps an `executorFeeBps` value to the valid range `[0, 9999]`.
pub fn clamp_fee_bps(fee_bps: u16) -> u16 {
    fee_bps.min(9999)
}

/// Computes the gross amount the executor must move from the maker, and the minimum net
/// amount the taker must receive, given the strategy's net payout and the executor's fee.
///
/// When `fee_bps == 0` or `net_out == 0`, gross equals net: there's nothing to gross up.
/// Otherwise `gross = ceil(net * 10000 / (10000 - fee_bps))`, which guarantees that after
/// the executor skims `fee_bps` from `gross`, the taker still receives at least `net`.
pub fn gross_up(net_out: U256, fee_bps: u16) -> (U256, U256) {
    let fee_bps = clamp_fee_bps(fee_bps);
    if fee_bps == 0 || net_out.is_zero() {
        return (net_out, net_out);
    }
    let numerator = net_out * U256::from(10_000u16);
    let denominator = U256::from(10_000u16 - fee_bps);
    let gross = ceil_div(numerator, denominator);
    (gross, net_out)
}

fn ceil_div(numerator: U256, denominator: U256) -> U256 {
    (numerator + denominator - U256::from(1u8)) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_uint_truncates_fractional_part() {
        assert_eq!(normalize_uint("350000000.999").unwrap(), U256::from(350_000_000u64));
    }

    #[test]
    fn normalize_uint_empty_is_zero() {
        assert_eq!(normalize_uint("").unwrap(), U256::ZERO);
    }

    #[test]
    fn normalize_uint_negative_clamps_to_zero() {
        assert_eq!(normalize_uint("-42").unwrap(), U256::ZERO);
    }

    #[test]
    fn normalize_uint_rejects_garbage() {
        assert!(normalize_uint("not-a-number").is_err());
    }

    #[test]
    fn gross_up_is_identity_at_zero_fee() {
        let (gross, min_net) = gross_up(U256::from(350_000_000u64), 0);
        assert_eq!(gross, U256::from(350_000_000u64));
        assert_eq!(min_net, U256::from(350_000_000u64));
    }

    #[test]
    fn gross_up_matches_spec_scenario_s2() {
        // S2: netOut = 350000000, executorFeeBps = 25 => ceil(350000000 * 10000 / 9975) = 350877193
        let (gross, min_net) = gross_up(U256::from(350_000_000u64), 25);
        assert_eq!(gross, U256::from(350_877_193u64));
        assert_eq!(min_net, U256::from(350_000_000u64));
    }

    #[test]
    fn gross_up_guarantees_taker_minimum_after_fee_skim() {
        let net_out = U256::from(123_456_789u64);
        let fee_bps = 250u16;
        let (gross, min_net) = gross_up(net_out, fee_bps);
        let after_skim = gross * U256::from(10_000u16 - fee_bps) / U256::from(10_000u16);
        assert!(after_skim >= min_net);
    }
}
