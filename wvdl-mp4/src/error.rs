use thiserror::Error;

/// The errors that may occur while handling key ids and `PSSH` boxes.
#[derive(Debug, Error)]
pub enum Error {
    /// Key id is not exactly 32 hex digits once separators are removed.
    #[error("invalid key id '{input}': {reason}")]
    InvalidKeyId { input: String, reason: String },

    #[error("invalid base64 encoded pssh box: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Box bytes do not follow the `PSSH` layout.
    #[error("malformed pssh box: {0}")]
    Malformed(String),

    #[error("invalid widevine protection data: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("cannot read {0}")]
    Read(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_kid<T: Into<String>, U: Into<String>>(input: T, reason: U) -> Self {
        Self::InvalidKeyId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed<T: Into<String>>(reason: T) -> Self {
        Self::Malformed(reason.into())
    }
}
