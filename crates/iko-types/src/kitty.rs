use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of one non-fungible kitty.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct KittyId(pub u64);

impl KittyId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Little-endian bytes used in canonical transaction encoding.
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl From<u64> for KittyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Debug for KittyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KittyId({})", self.0)
    }
}

impl fmt::Display for KittyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kitty#{}", self.0)
    }
}

impl FromStr for KittyId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("kitty#").unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|e| TypeError::InvalidKittyId(format!("{s}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let id = KittyId::new(42);
        assert_eq!(id.to_string(), "kitty#42");
        assert_eq!("kitty#42".parse::<KittyId>().unwrap(), id);
        assert_eq!("42".parse::<KittyId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            "kitty#-1".parse::<KittyId>(),
            Err(TypeError::InvalidKittyId(_))
        ));
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&KittyId::new(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn ordering_follows_integer_value() {
        assert!(KittyId::new(1) < KittyId::new(2));
    }
}
