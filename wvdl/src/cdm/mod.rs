//! Content decryption module capability.
//!
//! The session crypto lives behind [`Cdm`]. The run loads its `.wvd` device
//! once at startup into a [`LocalCdm`] and hands it to the license client; the
//! client owns each session from open to close.

mod local;

pub use local::LocalCdm;

use std::fmt;
use thiserror::Error;
use wvdl_mp4::{KeyId, PsshBox};

/// Error reported by a cdm implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CdmError(pub String);

impl CdmError {
    pub fn new<T: Into<String>>(reason: T) -> Self {
        Self(reason.into())
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Widevine license key container type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyType {
    Signing,
    Content,
    KeyControl,
    OperatorSession,
    Entitlement,
    OemContent,
}

impl From<widevine::KeyType> for KeyType {
    fn from(value: widevine::KeyType) -> Self {
        match value {
            widevine::KeyType::SIGNING => Self::Signing,
            widevine::KeyType::CONTENT => Self::Content,
            widevine::KeyType::KEY_CONTROL => Self::KeyControl,
            widevine::KeyType::OPERATOR_SESSION => Self::OperatorSession,
            widevine::KeyType::ENTITLEMENT => Self::Entitlement,
            widevine::KeyType::OEM_CONTENT => Self::OemContent,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Signing => "SIGNING",
            Self::Content => "CONTENT",
            Self::KeyControl => "KEY_CONTROL",
            Self::OperatorSession => "OPERATOR_SESSION",
            Self::Entitlement => "ENTITLEMENT",
            Self::OemContent => "OEM_CONTENT",
        })
    }
}

/// Key released by a license.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContentKey {
    pub kid: KeyId,
    pub key_type: KeyType,
    pub key: Vec<u8>,
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}:{}", self.key_type, self.kid, hex::encode(&self.key))
    }
}

/// Session based widevine cdm.
///
/// Calls for one session are made in the order `open`, `challenge`,
/// `parse_license`, `keys`, `close`, and `close` may come after any of them.
pub trait Cdm {
    fn open(&self) -> Result<SessionId, CdmError>;

    /// License request for `pssh`, ready to be posted to the license server.
    fn challenge(&self, session: &SessionId, pssh: &PsshBox) -> Result<Vec<u8>, CdmError>;

    fn parse_license(&self, session: &SessionId, license: &[u8]) -> Result<(), CdmError>;

    fn keys(&self, session: &SessionId) -> Result<Vec<ContentKey>, CdmError>;

    fn close(&self, session: &SessionId) -> Result<(), CdmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_type_from_license_container() {
        assert_eq!(KeyType::from(widevine::KeyType::CONTENT), KeyType::Content);
        assert_eq!(KeyType::from(widevine::KeyType::SIGNING), KeyType::Signing);
        assert_eq!(KeyType::from(widevine::KeyType::OEM_CONTENT).to_string(), "OEM_CONTENT");
    }

    #[test]
    fn content_key_display() {
        let key = ContentKey {
            kid: KeyId::from_bytes([0xab; 16]),
            key_type: KeyType::Content,
            key: vec![0x01; 16],
        };
        assert_eq!(
            key.to_string(),
            format!("[CONTENT] {}:{}", "ab".repeat(16), "01".repeat(16))
        );
    }
}
