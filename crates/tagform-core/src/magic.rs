use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Length of a magic code in bytes.
pub const MAGIC_LEN: usize = 4;

/// A 4-character alphanumeric code naming a handler.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Magic([u8; MAGIC_LEN]);

impl Magic {
    /// Parse a magic from a string.
    pub fn new(magic: &str) -> Result<Self, EngineError> {
        Self::from_bytes(magic.as_bytes())
    }

    /// Validate raw bytes as a magic.
    ///
    /// Exactly [`MAGIC_LEN`] bytes from `[A-Za-z0-9]`; anything else,
    /// including embedded NULs, is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        if !is_valid(bytes) {
            return Err(EngineError::InvalidMagic(
                String::from_utf8_lossy(bytes).into_owned(),
            ));
        }

        let mut raw = [0u8; MAGIC_LEN];
        raw.copy_from_slice(bytes);
        Ok(Self(raw))
    }

    pub const fn as_bytes(&self) -> &[u8; MAGIC_LEN] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Validated as ASCII on construction.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

/// Whether `bytes` form a valid magic.
pub fn is_valid(bytes: &[u8]) -> bool {
    bytes.len() == MAGIC_LEN && bytes.iter().all(u8::is_ascii_alphanumeric)
}

impl AsRef<[u8]> for Magic {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Magic({:?})", self.as_str())
    }
}

impl FromStr for Magic {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&[u8]> for Magic {
    type Error = EngineError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<&str> for Magic {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric_four_chars() {
        for magic in ["abc1", "spl1", "ZZZZ", "0000", "aB3x"] {
            assert!(Magic::new(magic).is_ok(), "{magic}");
        }
    }

    #[test]
    fn rejects_bad_length_nul_and_symbols() {
        for magic in [
            "", "ab", "abcd1", "a\0bc", "tky\0", "\0abc", "a\0b\0", "sapporo", "ab-c", "ab c",
            "abç",
        ] {
            assert!(
                matches!(Magic::new(magic), Err(EngineError::InvalidMagic(_))),
                "{magic:?}"
            );
        }
    }

    #[test]
    fn display_and_debug() {
        let magic: Magic = "spl1".parse().unwrap();
        assert_eq!(magic.to_string(), "spl1");
        assert_eq!(format!("{magic:?}"), "Magic(\"spl1\")");
        assert_eq!(magic.as_bytes(), b"spl1");
    }

    #[test]
    fn try_from_bytes() {
        assert!(Magic::try_from(&b"wd32"[..]).is_ok());
        assert!(Magic::try_from(&[0xffu8, 0, 1, 2][..]).is_err());
    }
}
