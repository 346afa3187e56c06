use crate::{Error, Result};
use std::{fmt, str::FromStr};

/// 128-bit key identifier.
///
/// Parsed from text by dropping hyphens (and the braces of a windows style
/// uuid), after which exactly 32 hex digits of any case must remain.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct KeyId([u8; 16]);

impl KeyId {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Key id from a raw byte slice, which must be 16 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 16] = bytes.try_into().map_err(|_| {
            Error::invalid_kid(
                hex::encode(bytes),
                format!("expected 16 bytes but found {}", bytes.len()),
            )
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase 32 hex digits.
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hyphenated 8-4-4-4-12 form.
    pub fn uuid(&self) -> String {
        let value = self.hex();
        format!(
            "{}-{}-{}-{}-{}",
            &value[..8],
            &value[8..12],
            &value[12..16],
            &value[16..20],
            &value[20..]
        )
    }
}

impl FromStr for KeyId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix('{')
            .and_then(|x| x.strip_suffix('}'))
            .unwrap_or(trimmed);
        let normalized = trimmed.replace('-', "");

        if normalized.len() != 32 {
            return Err(Error::invalid_kid(
                s,
                format!("expected 32 hex digits but found {}", normalized.len()),
            ));
        }

        if let Some(c) = normalized.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::invalid_kid(s, format!("'{}' is not a hex digit", c)));
        }

        let mut bytes = [0_u8; 16];
        hex::decode_to_slice(&normalized, &mut bytes)
            .map_err(|x| Error::invalid_kid(s, x.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}
