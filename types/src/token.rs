//! Token type identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// A 10-byte token type identifier, rendered as `tti_` + 20 hex chars.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId([u8; 10]);

impl TokenId {
    pub const PREFIX: &'static str = "tti_";

    /// The chain's native token.
    pub const NATIVE: Self = Self([0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);

    pub fn new(bytes: [u8; 10]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 10] {
        &self.0
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl FromStr for TokenId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| TypesError::InvalidTokenId(s.to_string()))?;
        let mut bytes = [0u8; 10];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|_| TypesError::InvalidTokenId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for TokenId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TokenId> for String {
    fn from(t: TokenId) -> Self {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_display() {
        assert_eq!(TokenId::NATIVE.to_string(), "tti_00000000000000000001");
    }

    #[test]
    fn parse_display_agree() {
        let id = TokenId::new([0xab, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let parsed: TokenId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed() {
        assert!("tti_123".parse::<TokenId>().is_err());
        assert!("xyz_00000000000000000001".parse::<TokenId>().is_err());
        assert!("tti_0000000000000000000g".parse::<TokenId>().is_err());
    }
}
