use std::path::PathBuf;
use thiserror::Error;

/// Every way a run can fail. Each variant aborts the run, nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("manifest unavailable at {url}: {reason}")]
    ManifestUnavailable { url: String, reason: String },

    #[error("cenc:default_KID not found in manifest")]
    KeyIdNotFound,

    #[error(transparent)]
    InvalidKeyId(wvdl_mp4::Error),

    #[error("embedded pssh box: {0}")]
    Pssh(wvdl_mp4::Error),

    #[error("auth token unavailable: {0}")]
    AuthTokenUnavailable(String),

    #[error("failed to load widevine device {}: {reason}", path.display())]
    DeviceLoad { path: PathBuf, reason: String },

    #[error("cdm session error: {0}")]
    CdmSession(String),

    #[error("license challenge generation failed: {0}")]
    ChallengeGenerationFailed(String),

    #[error("license request failed ({status}): '{body}'")]
    LicenseRequestFailed { status: u16, body: String },

    #[error("license server unreachable: {0}")]
    LicenseUnreachable(#[source] reqwest::Error),

    #[error("license response rejected by cdm: {0}")]
    LicenseParseFailed(String),

    #[error("license response carried no keys")]
    NoKeysReturned,

    #[error("downloader exited with {}", exit_reason(*code))]
    DownloadProcessFailed { code: Option<i32> },

    #[error("downloader did not finish within {seconds} seconds, segments kept in {}", temp_dir.display())]
    DownloadTimedOut { seconds: u64, temp_dir: PathBuf },

    #[error("downloader finished but {} is missing, segments kept in {}", expected.display(), temp_dir.display())]
    OutputMissing { expected: PathBuf, temp_dir: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<wvdl_mp4::Error> for Error {
    fn from(value: wvdl_mp4::Error) -> Self {
        match value {
            wvdl_mp4::Error::InvalidKeyId { .. } => Self::InvalidKeyId(value),
            _ => Self::Pssh(value),
        }
    }
}

fn exit_reason(code: Option<i32>) -> String {
    match code {
        Some(x) => format!("code {}", x),
        None => "a signal".to_owned(),
    }
}

/// A `Result` alias where the `Err` case is `wvdl::Error`.
pub type Result<T> = std::result::Result<T, Error>;
