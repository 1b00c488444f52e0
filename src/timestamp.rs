//! Unix timestamp type shared by quote expiry handling and EIP-712 signing.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::{SystemTime, SystemTimeError};

/// A Unix timestamp in seconds since the epoch, used for quote expiry.
///
/// Serialized as a plain JSON integer (unlike [`crate::types`] amount fields, which are
/// serialized as decimal strings to avoid precision loss for values beyond `u64`/`f64` range).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(pub u64);

impl From<UnixTimestamp> for U256 {
    fn from(value: UnixTimestamp) -> Self {
        U256::from(value.0)
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_add(rhs))
    }
}

impl UnixTimestamp {
    pub fn try_now() -> Result<Self, SystemTimeError> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs();
        Ok(Self(now))
    }

    pub fn seconds_since_epoch(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_integer() {
        let ts = UnixTimestamp(1736000000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "1736000000");
    }

    #[test]
    fn add_saturates_instead_of_overflowing() {
        let ts = UnixTimestamp(u64::MAX);
        assert_eq!((ts + 10).0, u64::MAX);
    }
}
