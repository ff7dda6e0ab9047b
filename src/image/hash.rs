//! Content digests (`algorithm:hex`)
//!
//! A [`Hash`] is the identity of a blob. It is parsed and compared, never
//! computed here: the caller's claimed digest is trusted as given.

use crate::error::{Result, TransferError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Parsed content digest such as `sha256:e3b0c442...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash {
    pub algorithm: String,
    pub hex: String,
}

impl Hash {
    pub fn parse(input: &str) -> Result<Self> {
        let fail = |reason: &str| TransferError::HashParse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (algorithm, hex_part) = input
            .split_once(':')
            .ok_or_else(|| fail("expected algorithm:hex"))?;

        let expected_bytes = match algorithm {
            "sha256" => 32,
            "sha512" => 64,
            "" => return Err(fail("missing algorithm")),
            _ => return Err(fail("unsupported algorithm")),
        };

        if hex_part.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(fail("hex must be lowercase"));
        }
        let bytes = hex::decode(hex_part).map_err(|e| fail(&e.to_string()))?;
        if bytes.len() != expected_bytes {
            return Err(fail(&format!(
                "expected {} hex characters, got {}",
                expected_bytes * 2,
                hex_part.len()
            )));
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex_part.to_string(),
        })
    }

    /// Abbreviated form for progress messages
    pub fn short(&self) -> String {
        let end = self.hex.len().min(12);
        format!("{}:{}", self.algorithm, &self.hex[..end])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Hash {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self> {
        Hash::parse(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Hash::parse(&text).map_err(serde::de::Error::custom)
    }
}
