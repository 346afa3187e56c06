use crate::{DownloadConfig, Error, Result, selector::SelectedKey};
use colored::Colorize;
use log::{error, info, warn};
use reqwest::Url;
use std::{
    ffi::OsString,
    fs,
    path::PathBuf,
    process::{Child, Command, ExitStatus},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One invocation of the downloader.
#[derive(Clone, Debug)]
pub struct DownloadJob {
    pub url: Url,
    pub cookie_header: String,
    pub key: SelectedKey,
    pub save_name: String,
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
}

impl DownloadJob {
    /// File the downloader is expected to leave behind.
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(format!("{}.mp4", self.save_name))
    }
}

#[derive(Debug)]
pub struct DownloadReport {
    pub output: PathBuf,
}

/// Drives N_m3u8DL-RE through download, real time decryption and muxing.
pub struct Orchestrator {
    config: DownloadConfig,
}

impl Orchestrator {
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    /// Job for `url` named `<prefix>_<local timestamp>`.
    pub fn job(&self, url: Url, cookie_header: String, key: SelectedKey) -> DownloadJob {
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");

        DownloadJob {
            url,
            cookie_header,
            key,
            save_name: format!("{}_{}", self.config.save_prefix, timestamp),
            output_dir: self.config.output_dir.clone(),
            temp_dir: self.config.temp_dir.clone(),
        }
    }

    pub fn args(&self, job: &DownloadJob) -> Vec<OsString> {
        let binaries = &self.config.binaries;
        let mut args: Vec<OsString> = vec![
            job.url.as_str().into(),
            "--save-name".into(),
            job.save_name.clone().into(),
            "--save-dir".into(),
            job.output_dir.clone().into(),
            "--tmp-dir".into(),
            job.temp_dir.clone().into(),
            "--download-retry-count".into(),
            self.config.retry_count.to_string().into(),
            "--auto-select".into(),
            "--thread-count".into(),
            self.config.thread_count.to_string().into(),
        ];

        if let Some(mp4decrypt) = &binaries.mp4decrypt {
            args.extend([
                OsString::from("--mp4-real-time-decryption"),
                "--decryption-binary-path".into(),
                mp4decrypt.clone().into(),
            ]);
        }

        args.extend([
            OsString::from("--mux-after-done"),
            "format=mp4".into(),
            "--ffmpeg-binary-path".into(),
            binaries.ffmpeg.clone().into(),
            "--live-pipe-mux".into(),
            "--check-segments-count".into(),
            "--log-level".into(),
            "INFO".into(),
            "--key".into(),
            job.key.to_string().into(),
            "-H".into(),
            format!("Cookie: {}", job.cookie_header).into(),
            "-mt".into(),
        ]);

        args
    }

    /// Run the downloader to completion and verify its output.
    ///
    /// The temp directory is removed only once the output file exists; on any
    /// failure it is kept so that segments can be recovered by hand.
    pub fn run(&self, job: &DownloadJob) -> Result<DownloadReport> {
        let downloader = &self.config.binaries.downloader;
        let args = self.args(job);

        info!(
            "Executing {} {}",
            downloader.to_string_lossy().bold(),
            args.iter()
                .map(|x| x.to_string_lossy())
                .map(|x| if x.contains(' ') {
                    format!("\"{}\"", x)
                } else {
                    x.into_owned()
                })
                .collect::<Vec<_>>()
                .join(" ")
        );
        info!("Output directory {}", job.output_dir.display());

        let mut child = Command::new(downloader).args(&args).spawn()?;
        let status = match self.config.timeout {
            Some(timeout) => wait_timeout(&mut child, timeout)?,
            None => Some(child.wait()?),
        };

        let Some(status) = status else {
            error!("Segments are kept in {}", job.temp_dir.display());
            return Err(Error::DownloadTimedOut {
                seconds: self.config.timeout.unwrap_or_default().as_secs(),
                temp_dir: job.temp_dir.clone(),
            });
        };

        if !status.success() {
            return Err(Error::DownloadProcessFailed {
                code: status.code(),
            });
        }

        let output = job.output_file();

        if !output.exists() {
            error!(
                "Download finished but {} is missing, check {} for leftover segments",
                output.display(),
                job.temp_dir.display()
            );
            return Err(Error::OutputMissing {
                expected: output,
                temp_dir: job.temp_dir.clone(),
            });
        }

        info!("Saved {}", output.display().to_string().green());

        if job.temp_dir.exists() {
            info!("Deleting {}", job.temp_dir.display());

            if let Err(e) = fs::remove_dir_all(&job.temp_dir) {
                warn!("Could not delete {}: {}", job.temp_dir.display(), e);
            }
        }

        Ok(DownloadReport { output })
    }
}

/// Wait for `child` at most `timeout`, killing it once exceeded.
fn wait_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let started = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }

        if started.elapsed() >= timeout {
            warn!("Downloader exceeded {}s, killing it", timeout.as_secs());
            let killed = child.kill();
            return after_kill(child, killed);
        }

        thread::sleep(POLL_INTERVAL.min(timeout));
    }
}

/// A failed kill usually means the child exited after the last poll.
fn after_kill(
    child: &mut Child,
    killed: std::io::Result<()>,
) -> std::io::Result<Option<ExitStatus>> {
    if let Err(e) = killed {
        return match child.try_wait()? {
            Some(status) => Ok(Some(status)),
            None => Err(e),
        };
    }

    child.wait()?;
    Ok(None)
}
