use crate::{
    Error, Result,
    cdm::{ContentKey, KeyType},
};
use std::fmt;
use wvdl_mp4::KeyId;

/// The key handed to the downloader, displayed as `kid:key` in lowercase hex.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectedKey {
    kid: KeyId,
    key: Vec<u8>,
}

impl SelectedKey {
    pub fn new(kid: KeyId, key: Vec<u8>) -> Self {
        Self { kid, key }
    }

    pub fn kid(&self) -> &KeyId {
        &self.kid
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl From<&ContentKey> for SelectedKey {
    fn from(value: &ContentKey) -> Self {
        Self {
            kid: value.kid,
            key: value.key.clone(),
        }
    }
}

impl fmt::Display for SelectedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kid.hex(), hex::encode(&self.key))
    }
}

/// Pick the one key the downloader gets.
///
/// A lone key is taken as is. Among several, the first `CONTENT` key wins and
/// without one the first returned key is used.
pub fn select(keys: &[ContentKey]) -> Result<SelectedKey> {
    match keys {
        [] => Err(Error::NoKeysReturned),
        [key] => Ok(key.into()),
        _ => Ok(keys
            .iter()
            .find(|x| x.key_type == KeyType::Content)
            .unwrap_or(&keys[0])
            .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8, key_type: KeyType) -> ContentKey {
        ContentKey {
            kid: KeyId::from_bytes([byte; 16]),
            key_type,
            key: vec![byte.wrapping_add(1); 16],
        }
    }

    #[test]
    fn empty_set_fails() {
        assert!(matches!(select(&[]), Err(Error::NoKeysReturned)));
    }

    #[test]
    fn single_key_is_selected_whatever_its_type() {
        let keys = [key(0x0a, KeyType::Signing)];
        assert_eq!(select(&keys).unwrap(), SelectedKey::from(&keys[0]));
    }

    #[test]
    fn content_key_wins_regardless_of_position() {
        let keys = [
            key(0x01, KeyType::Signing),
            key(0x02, KeyType::OperatorSession),
            key(0x03, KeyType::Content),
            key(0x04, KeyType::Content),
        ];
        assert_eq!(select(&keys).unwrap().kid(), &keys[2].kid);
    }

    // Policy: without a CONTENT key the first returned key is used, not the second.
    #[test]
    fn falls_back_to_first_position() {
        let keys = [key(0x01, KeyType::Signing), key(0x02, KeyType::Entitlement)];
        assert_eq!(select(&keys).unwrap(), SelectedKey::from(&keys[0]));
    }

    #[test]
    fn selection_is_deterministic() {
        let keys = [key(0x01, KeyType::Signing), key(0x02, KeyType::Content)];
        let first = select(&keys).unwrap();

        for _ in 0..8 {
            assert_eq!(select(&keys).unwrap(), first);
        }
    }

    #[test]
    fn renders_kid_key_pair() {
        let keys = [ContentKey {
            kid: "AB12CD34-EF56-0123-4567-890ABCDEF0EF".parse().unwrap(),
            key_type: KeyType::Content,
            key: vec![0xde, 0xad, 0xbe, 0xef],
        }];
        assert_eq!(
            select(&keys).unwrap().to_string(),
            "ab12cd34ef5601234567890abcdef0ef:deadbeef"
        );
    }
}
