use crate::{Error, Result, manifest::PsshPolicy};
use log::warn;
use reqwest::Url;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_LICENSE_URL: &str =
    "https://lic.drmtoday.com/license-proxy-widevine/cenc/?specConform=true";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Inputs of the license acquisition stages.
#[derive(Clone, Debug)]
pub struct Config {
    pub mpd_url: Url,
    /// Raw `document.cookie` style string.
    pub cookies: String,
    pub auth_url: Url,
    pub license_url: Url,
    pub pssh_policy: PsshPolicy,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    pub fn new(mpd_url: Url, cookies: impl Into<String>, auth_url: Url) -> Self {
        Self {
            mpd_url,
            cookies: cookies.into(),
            auth_url,
            license_url: DEFAULT_LICENSE_URL
                .parse()
                .expect("default license url is valid"),
            pssh_policy: PsshPolicy::default(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// External tools driven by the download stage.
#[derive(Clone, Debug)]
pub struct Binaries {
    pub downloader: PathBuf,
    pub ffmpeg: PathBuf,
    /// Without it the downloader decrypts after the download instead of in real time.
    pub mp4decrypt: Option<PathBuf>,
}

impl Binaries {
    pub fn resolve(downloader: &str, ffmpeg: &str, mp4decrypt: &str) -> Result<Self> {
        let Some(downloader) = resolve_binary(downloader) else {
            return Err(Error::Config(format!(
                "'{}' downloader could not be found, set N_M3U8DL_PATH or add it to PATH",
                downloader
            )));
        };

        let Some(ffmpeg) = resolve_binary(ffmpeg) else {
            return Err(Error::Config(format!(
                "'{}' could not be found, it is required for muxing",
                ffmpeg
            )));
        };

        let mp4decrypt_path = resolve_binary(mp4decrypt);

        if mp4decrypt_path.is_none() {
            warn!(
                "'{}' could not be found, real time decryption is disabled",
                mp4decrypt
            );
        }

        Ok(Self {
            downloader,
            ffmpeg,
            mp4decrypt: mp4decrypt_path,
        })
    }
}

#[derive(Clone, Debug)]
pub struct DownloadConfig {
    pub binaries: Binaries,
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub save_prefix: String,
    pub retry_count: u8,
    pub thread_count: u8,
    pub timeout: Option<Duration>,
}

/// Resolve a binary given either as a path or as a name.
///
/// Lookup order is the literal path, then every `PATH` entry, then
/// `<name>.exe` in the working directory.
pub fn resolve_binary(name_or_path: &str) -> Option<PathBuf> {
    let path = Path::new(name_or_path);

    if path.is_file() {
        return std::path::absolute(path).ok();
    }

    let bin = if cfg!(target_os = "windows") && path.extension().is_none() {
        format!("{}.exe", name_or_path)
    } else {
        name_or_path.to_owned()
    };

    if let Some(found) = env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|x| x.join(&bin))
            .find(|x| x.is_file())
    }) {
        return Some(found);
    }

    let exe = env::current_dir()
        .ok()?
        .join(format!("{}.exe", name_or_path));
    exe.is_file().then_some(exe)
}

/// Absolute form of `dir`, created if missing.
pub fn prepare_dir(dir: &Path) -> Result<PathBuf> {
    let dir = std::path::absolute(dir)?;
    fs::create_dir_all(&dir).map_err(|x| {
        Error::Config(format!("could not create {}: {}", dir.display(), x))
    })?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_literal_path() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("N_m3u8DL-RE");
        fs::write(&bin, b"").unwrap();

        assert_eq!(resolve_binary(bin.to_str().unwrap()), Some(bin));
    }

    #[test]
    fn missing_binary_is_none() {
        assert_eq!(resolve_binary("wvdl-surely-missing-binary"), None);
    }

    #[test]
    fn missing_downloader_is_config_error() {
        let result = Binaries::resolve("wvdl-surely-missing-binary", "ffmpeg", "mp4decrypt");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn prepare_dir_creates_absolute_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Downloads").join("live");

        let prepared = prepare_dir(&nested).unwrap();
        assert!(prepared.is_absolute());
        assert!(prepared.is_dir());
    }

    #[test]
    fn config_defaults() {
        let config = Config::new(
            "https://example.com/live.mpd".parse().unwrap(),
            "a=b",
            "https://example.com/auth".parse().unwrap(),
        );
        assert_eq!(config.license_url.as_str(), DEFAULT_LICENSE_URL);
        assert_eq!(config.pssh_policy, PsshPolicy::Rebuild);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
    }
}
