use crate::{
    Binaries, Config, DownloadConfig, Result,
    cdm::LocalCdm,
    config::{self, DEFAULT_LICENSE_URL, DEFAULT_USER_AGENT},
    manifest::PsshPolicy,
};
use clap::Args;
use reqwest::Url;
use std::{path::PathBuf, time::Duration};

#[derive(Args, Clone, Debug)]
pub struct SourceOptions {
    /// DASH manifest url.
    #[arg(long, env = "URL_MPD", value_name = "URL")]
    pub mpd_url: Url,

    /// Cookies sent with the manifest request, in the same format as document.cookie.
    #[arg(long, env = "COOKIE_MPD", hide_env_values = true)]
    pub cookie: String,

    /// Endpoint answering with {"auth_token": "..."} for the license server.
    #[arg(long, env = "AUTH_URL", value_name = "URL")]
    pub auth_url: Url,

    /// Widevine license server url.
    #[arg(long, env = "LICENSE_URL", value_name = "URL", default_value = DEFAULT_LICENSE_URL, help_heading = "License Options")]
    pub license_url: Url,

    /// Send the manifest's own widevine pssh box instead of building one from the default KID.
    #[arg(long, help_heading = "License Options")]
    pub trust_embedded_pssh: bool,

    /// Timeout for every http request.
    #[arg(long, value_name = "SECONDS", default_value_t = 30, help_heading = "Client Options")]
    pub http_timeout: u64,

    /// User agent header for requests.
    #[arg(long, default_value = DEFAULT_USER_AGENT, help_heading = "Client Options")]
    pub user_agent: String,
}

impl SourceOptions {
    pub fn config(&self) -> Config {
        Config {
            mpd_url: self.mpd_url.clone(),
            cookies: self.cookie.clone(),
            auth_url: self.auth_url.clone(),
            license_url: self.license_url.clone(),
            pssh_policy: if self.trust_embedded_pssh {
                PsshPolicy::PreferEmbedded
            } else {
                PsshPolicy::Rebuild
            },
            http_timeout: Duration::from_secs(self.http_timeout),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct CdmOptions {
    /// Widevine device (.wvd) file whose private key signs license challenges.
    #[arg(long, env = "WVD_PATH", value_name = "WVD", default_value = "device.wvd", help_heading = "Cdm Options")]
    pub wvd: PathBuf,
}

impl CdmOptions {
    /// Load the device once, failing the whole run when it cannot be read.
    pub fn load(&self) -> Result<LocalCdm> {
        LocalCdm::from_wvd(&self.wvd)
    }
}

#[derive(Args, Clone, Debug)]
pub struct DownloadOptions {
    /// Directory for the muxed output file.
    #[arg(long, env = "OUTPUT_DIR", default_value = "Downloads", help_heading = "Download Options")]
    pub output_dir: PathBuf,

    /// Directory for downloaded segments, removed after a verified download.
    #[arg(long, env = "TEMP_DIR", default_value = "Temp", help_heading = "Download Options")]
    pub temp_dir: PathBuf,

    /// Prefix of the output file name, followed by a timestamp.
    #[arg(long, default_value = "eplus", help_heading = "Download Options")]
    pub save_prefix: String,

    /// Maximum number of retries to download an individual segment.
    #[arg(long, default_value_t = 5, help_heading = "Download Options")]
    pub retry_count: u8,

    /// Number of threads for parallel downloading of segments.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u8).range(1..=64), help_heading = "Download Options")]
    pub thread_count: u8,

    /// Kill the downloader after this many seconds. Segments are kept.
    #[arg(long, value_name = "SECONDS", help_heading = "Download Options")]
    pub download_timeout: Option<u64>,

    /// N_m3u8DL-RE name or path.
    #[arg(long, env = "N_M3U8DL_PATH", default_value = "N_m3u8DL-RE", help_heading = "Binary Options")]
    pub downloader: String,

    /// ffmpeg name or path.
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg", help_heading = "Binary Options")]
    pub ffmpeg: String,

    /// mp4decrypt name or path, real time decryption is disabled without it.
    #[arg(long, env = "MP4DECRYPT_PATH", default_value = "mp4decrypt", help_heading = "Binary Options")]
    pub mp4decrypt: String,
}

impl DownloadOptions {
    pub fn config(&self) -> Result<DownloadConfig> {
        Ok(DownloadConfig {
            binaries: Binaries::resolve(&self.downloader, &self.ffmpeg, &self.mp4decrypt)?,
            output_dir: config::prepare_dir(&self.output_dir)?,
            temp_dir: config::prepare_dir(&self.temp_dir)?,
            save_prefix: self.save_prefix.clone(),
            retry_count: self.retry_count,
            thread_count: self.thread_count,
            timeout: self.download_timeout.map(Duration::from_secs),
        })
    }
}
