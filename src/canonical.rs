//! Pure, side-effect-free helpers shared by the persistence and orchestration layers:
//! address checksumming and the canonical ordering of a trading pair.

use alloy_primitives::Address;

/// Renders `address` in EIP-55 mixed-case checksum form, with a `0x` prefix.
pub fn checksum(address: &Address) -> String {
    address.to_checksum(None)
}

/// Parses a string as an address and requires it to already be in checksummed form.
/// Rejects all-lowercase, all-uppercase, or partially-checksummed input: the transport
/// surface never silently "fixes" an address, it rejects the request.
pub fn parse_checksummed(s: &str) -> Result<Address, String> {
    let address: Address = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid address"))?;
    if checksum(&address) != s {
        return Err(format!("'{s}' is not checksummed"));
    }
    Ok(address)
}

/// Orders two addresses into the canonical `(token0, token1)` pair used as the Pair
/// Admission Store's primary key: the lexicographically smaller lowercased hex string is
/// `token0`. Returns `(token0, token1, first_was_token0)`.
pub fn canonical_pair(a: Address, b: Address) -> (Address, Address, bool) {
    let a_lower = a.to_string().to_lowercase();
    let b_lower = b.to_string().to_lowercase();
    if a_lower <= b_lower {
        (a, b, true)
    } else {
        (b, a, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tail: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = tail;
        Address::from(bytes)
    }

    #[test]
    fn canonical_pair_is_commutative() {
        let a = addr(1);
        let b = addr(2);
        let (t0_ab, t1_ab, first_is_t0_ab) = canonical_pair(a, b);
        let (t0_ba, t1_ba, first_is_t0_ba) = canonical_pair(b, a);
        assert_eq!(t0_ab, t0_ba);
        assert_eq!(t1_ab, t1_ba);
        assert_eq!(first_is_t0_ab, !first_is_t0_ba);
    }

    #[test]
    fn canonical_pair_is_idempotent() {
        let a = addr(3);
        let b = addr(9);
        let first = canonical_pair(a, b);
        let second = canonical_pair(first.0, first.1);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn checksum_roundtrips_through_parse_checksummed() {
        let a = addr(42);
        let checksummed = checksum(&a);
        let parsed = parse_checksummed(&checksummed).expect("checksummed address parses");
        assert_eq!(parsed, a);
    }

    #[test]
    fn parse_checksummed_rejects_all_lowercase() {
        let a = addr(42);
        let lower = a.to_string().to_lowercase();
        assert!(parse_checksummed(&lower).is_err());
    }
}
