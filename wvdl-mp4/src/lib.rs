//! Widevine `PSSH` box builder and parser.
//!
//! A license server identifies the content it should release keys for by the
//! protection system specific header (`PSSH`) box carried in the challenge.
//! This crate builds that box from a single key id and reads the boxes which
//! manifests sometimes embed.
//!
//! ```
//! use wvdl_mp4::{KeyId, PsshBox};
//!
//! let kid = "0d1c2b3a-4958-6776-8594-a3b2c1d0e0f1".parse::<KeyId>()?;
//! let pssh = PsshBox::widevine(&kid);
//!
//! assert_eq!(pssh.as_bytes().len(), 56);
//! assert_eq!(&pssh.as_bytes()[34..50], kid.as_bytes());
//! # Ok::<(), wvdl_mp4::Error>(())
//! ```

mod error;
mod kid;
mod pssh;
mod reader;
mod widevine;

pub use error::Error;
pub use kid::KeyId;
pub use pssh::{PLAYREADY_SYSTEM_ID, PsshBox, SystemId, WIDEVINE_SYSTEM_ID};
pub use reader::Reader;

/// A `Result` alias where the `Err` case is `wvdl_mp4::Error`.
pub type Result<T> = std::result::Result<T, Error>;
