//! Acquire a Widevine content key for a DASH stream and hand it to
//! N_m3u8DL-RE for download, real time decryption and muxing.
//!
//! The run is a fixed chain of blocking stages sharing one [`Context`]:
//! [`manifest`] finds the default KID, [`wvdl_mp4::PsshBox`] turns it into the
//! challenge init data, [`license`] drives a [`cdm::Cdm`] session against the
//! license server, [`selector`] picks one key and [`download`] runs the
//! external downloader. Any failure aborts the run.

pub mod auth;
pub mod cdm;
pub mod config;
pub mod cookie;
pub mod download;
pub mod license;
pub mod logger;
pub mod manifest;
pub mod pipeline;
pub mod selector;

mod commands;
mod context;
mod error;

#[doc(hidden)]
pub use commands::{Args, Commands};

pub use config::{Binaries, Config, DownloadConfig};
pub use context::Context;
pub use error::{Error, Result};
pub use wvdl_mp4;
