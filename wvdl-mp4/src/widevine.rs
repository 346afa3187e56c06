use crate::{KeyId, Result};
use prost::Message;

include!(concat!(env!("OUT_DIR"), "/widevine.rs"));

/// `cenc` four character code.
const CENC_SCHEME: u32 = u32::from_be_bytes(*b"cenc");

/// Protection data naming a single key id under the `cenc` scheme.
pub(crate) fn encode(kid: &KeyId) -> Vec<u8> {
    WidevinePsshData {
        key_ids: vec![kid.as_bytes().to_vec()],
        protection_scheme: Some(CENC_SCHEME),
        ..Default::default()
    }
    .encode_to_vec()
}

/// Key ids listed in widevine protection data. Ids that are not 16 bytes are skipped.
pub(crate) fn key_ids(data: &[u8]) -> Result<Vec<KeyId>> {
    let wv = WidevinePsshData::decode(data)?;

    wv.key_ids
        .iter()
        .filter(|x| x.len() == 16)
        .map(|x| KeyId::from_slice(x))
        .collect()
}
