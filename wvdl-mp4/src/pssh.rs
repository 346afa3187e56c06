/*
    REFERENCES
    ----------

    1. https://w3c.github.io/encrypted-media/format-registry/initdata/cenc.html
    2. https://github.com/shaka-project/shaka-packager/blob/56e227267c9091a0f65b4d92d9064dda4557f3a7/packager/tools/pssh/pssh-box.py
    3. https://github.com/rlaphoenix/pywidevine/blob/master/pywidevine/pssh.py

*/

use crate::{Error, KeyId, Reader, Result, widevine};
use base64::Engine;
use std::fmt;

pub const WIDEVINE_SYSTEM_ID: [u8; 16] = [
    0xed, 0xef, 0x8b, 0xa9, 0x79, 0xd6, 0x4a, 0xce, 0xa3, 0xc8, 0x27, 0xdc, 0xd5, 0x1d, 0x21, 0xed,
];
pub const PLAYREADY_SYSTEM_ID: [u8; 16] = [
    0x9a, 0x04, 0xf0, 0x79, 0x98, 0x40, 0x42, 0x86, 0xab, 0x92, 0xe6, 0x5b, 0xe0, 0x88, 0x5f, 0x95,
];
const COMMON_SYSTEM_ID: [u8; 16] = [
    0x10, 0x77, 0xef, 0xec, 0xc0, 0xb2, 0x4d, 0x02, 0xac, 0xe3, 0x3c, 0x1e, 0x52, 0xe2, 0xfb, 0x4b,
];

/// Box header size of a version 0 box: size, type, version and flags, system id, data size.
const V0_HEADER_SIZE: usize = 32;

/// Protection system a `PSSH` box is addressed to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SystemId {
    Common,
    PlayReady,
    Widevine,
    Other([u8; 16]),
}

impl SystemId {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        match bytes {
            COMMON_SYSTEM_ID => Self::Common,
            PLAYREADY_SYSTEM_ID => Self::PlayReady,
            WIDEVINE_SYSTEM_ID => Self::Widevine,
            x => Self::Other(x),
        }
    }

    pub fn to_bytes(self) -> [u8; 16] {
        match self {
            Self::Common => COMMON_SYSTEM_ID,
            Self::PlayReady => PLAYREADY_SYSTEM_ID,
            Self::Widevine => WIDEVINE_SYSTEM_ID,
            Self::Other(x) => x,
        }
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "common"),
            Self::PlayReady => write!(f, "playready"),
            Self::Widevine => write!(f, "widevine"),
            Self::Other(x) => write!(f, "{}", hex::encode(x)),
        }
    }
}

/// An immutable `PSSH` box.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PsshBox {
    data: Vec<u8>,
    version: u8,
    system_id: SystemId,
    key_ids: Vec<KeyId>,
    init_data: Vec<u8>,
}

impl PsshBox {
    /// Build the version 0 widevine box for a single key id.
    ///
    /// The layout is fixed (56 bytes, big-endian) and license servers compare
    /// it strictly, so nothing here is configurable.
    pub fn widevine(kid: &KeyId) -> Self {
        let init_data = widevine::encode(kid);
        let size = V0_HEADER_SIZE + init_data.len();

        let mut data = Vec::with_capacity(size);
        data.extend_from_slice(&(size as u32).to_be_bytes());
        data.extend_from_slice(b"pssh");
        data.extend_from_slice(&0_u32.to_be_bytes());
        data.extend_from_slice(&WIDEVINE_SYSTEM_ID);
        data.extend_from_slice(&(init_data.len() as u32).to_be_bytes());
        data.extend_from_slice(&init_data);

        Self {
            data,
            version: 0,
            system_id: SystemId::Widevine,
            key_ids: vec![*kid],
            init_data,
        }
    }

    /// Parse a complete version 0 or 1 box.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data.to_vec());

        let size = reader.read_u32()?;
        if size as usize != data.len() {
            return Err(Error::malformed(format!(
                "box size is {} but {} bytes were given",
                size,
                data.len()
            )));
        }

        let box_type = reader.read_array::<4>()?;
        if &box_type != b"pssh" {
            return Err(Error::malformed(format!(
                "expected 'pssh' box type but found '{}'",
                String::from_utf8_lossy(&box_type)
            )));
        }

        let version = (reader.read_u32()? >> 24) as u8;
        if version > 1 {
            return Err(Error::malformed(format!(
                "version {} is not supported",
                version
            )));
        }

        let system_id = SystemId::from_bytes(reader.read_array::<16>()?);
        let mut key_ids = Vec::new();

        if version == 1 {
            let count = reader.read_u32()?;

            for _ in 0..count {
                key_ids.push(KeyId::from_bytes(reader.read_array::<16>()?));
            }
        }

        let init_data_size = reader.read_u32()?;
        let init_data = reader.read_bytes(init_data_size as usize)?;

        if reader.has_more_data() {
            return Err(Error::malformed(format!(
                "{} trailing bytes after protection data",
                reader.remaining()
            )));
        }

        if system_id == SystemId::Widevine {
            key_ids.extend(widevine::key_ids(&init_data)?);
        }

        let mut unique = Vec::with_capacity(key_ids.len());
        for kid in key_ids {
            if !unique.contains(&kid) {
                unique.push(kid);
            }
        }

        Ok(Self {
            data: data.to_vec(),
            version,
            system_id,
            key_ids: unique,
            init_data,
        })
    }

    pub fn from_base64(input: &str) -> Result<Self> {
        let data = base64::engine::general_purpose::STANDARD.decode(input.trim())?;
        Self::from_bytes(&data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn system_id(&self) -> SystemId {
        self.system_id
    }

    /// Key ids listed in the box header (version 1) and, for widevine, in
    /// the protection data.
    pub fn key_ids(&self) -> &[KeyId] {
        &self.key_ids
    }

    pub fn init_data(&self) -> &[u8] {
        &self.init_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KID: &str = "ab12cd34-ef56-0123-4567-890abcdef0ef";
    const KID_BOX_BASE64: &str =
        "AAAAOHBzc2gAAAAA7e+LqXnWSs6jyCfc1R0h7QAAABgSEKsSzTTvVgEjRWeJCrze8O9I49yVmwY=";

    fn kid() -> KeyId {
        KID.parse().unwrap()
    }

    #[test]
    fn widevine_box_layout() {
        let pssh = PsshBox::widevine(&kid());
        let bytes = pssh.as_bytes();

        assert_eq!(bytes.len(), 56);
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x00, 0x38]);
        assert_eq!(&bytes[4..8], b"pssh");
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            &bytes[12..28],
            &[
                0xed, 0xef, 0x8b, 0xa9, 0x79, 0xd6, 0x4a, 0xce, 0xa3, 0xc8, 0x27, 0xdc, 0xd5,
                0x1d, 0x21, 0xed
            ]
        );
        assert_eq!(&bytes[28..32], &[0x00, 0x00, 0x00, 0x18]);
        assert_eq!(&bytes[32..34], &[0x12, 0x10]);
        assert_eq!(&bytes[34..50], kid().as_bytes());
        assert_eq!(&bytes[50..56], &[0x48, 0xe3, 0xdc, 0x95, 0x9b, 0x06]);
    }

    #[test]
    fn widevine_box_base64() {
        assert_eq!(PsshBox::widevine(&kid()).to_base64(), KID_BOX_BASE64);
    }

    #[test]
    fn widevine_box_is_deterministic() {
        let hyphenated = PsshBox::widevine(&kid());
        let plain = PsshBox::widevine(&KID.replace('-', "").to_uppercase().parse().unwrap());
        assert_eq!(hyphenated.as_bytes(), plain.as_bytes());
        assert_eq!(hyphenated, PsshBox::widevine(&kid()));
    }

    #[test]
    fn base64_decode_then_encode_is_stable() {
        let pssh = PsshBox::from_base64(KID_BOX_BASE64).unwrap();
        assert_eq!(pssh.to_base64(), KID_BOX_BASE64);
        assert_eq!(pssh, PsshBox::widevine(&kid()));
    }

    #[test]
    fn parses_widevine_v0_box() {
        let pssh = PsshBox::from_base64(KID_BOX_BASE64).unwrap();
        assert_eq!(pssh.version(), 0);
        assert_eq!(pssh.system_id(), SystemId::Widevine);
        assert_eq!(pssh.key_ids(), &[kid()]);
        assert_eq!(pssh.init_data().len(), 0x18);
    }

    #[test]
    fn parses_v1_box_header_key_ids() {
        let other = KeyId::from_bytes([0x11; 16]);
        let mut data = Vec::new();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"pssh");
        data.extend_from_slice(&[1, 0, 0, 0]);
        data.extend_from_slice(&PLAYREADY_SYSTEM_ID);
        data.extend_from_slice(&2_u32.to_be_bytes());
        data.extend_from_slice(kid().as_bytes());
        data.extend_from_slice(other.as_bytes());
        data.extend_from_slice(&3_u32.to_be_bytes());
        data.extend_from_slice(&[1, 2, 3]);
        let size = data.len() as u32;
        data[0..4].copy_from_slice(&size.to_be_bytes());

        let pssh = PsshBox::from_bytes(&data).unwrap();
        assert_eq!(pssh.version(), 1);
        assert_eq!(pssh.system_id(), SystemId::PlayReady);
        assert_eq!(pssh.key_ids(), &[kid(), other]);
        assert_eq!(pssh.init_data(), &[1, 2, 3]);
    }

    #[test]
    fn rejects_wrong_box_type() {
        let mut data = PsshBox::widevine(&kid()).as_bytes().to_vec();
        data[4..8].copy_from_slice(b"moov");
        assert!(matches!(
            PsshBox::from_bytes(&data),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn rejects_size_mismatch() {
        let mut data = PsshBox::widevine(&kid()).as_bytes().to_vec();
        data.push(0);
        assert!(matches!(
            PsshBox::from_bytes(&data),
            Err(Error::Malformed(_))
        ));
        assert!(PsshBox::from_bytes(&data[..20]).is_err());
    }

    #[test]
    fn rejects_corrupt_widevine_data() {
        let mut data = PsshBox::widevine(&kid()).as_bytes().to_vec();
        // key id length claims more bytes than the protection data holds
        data[33] = 0x7f;
        assert!(matches!(
            PsshBox::from_bytes(&data),
            Err(Error::Protobuf(_))
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            PsshBox::from_base64("not base64!"),
            Err(Error::Base64(_))
        ));
    }
}
