use super::options::{CdmOptions, SourceOptions};
use crate::{Context, pipeline::Pipeline};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Request the content keys of a manifest and print them without downloading.
#[derive(Args, Clone, Debug)]
pub struct License {
    #[command(flatten)]
    source: SourceOptions,

    #[command(flatten)]
    cdm: CdmOptions,
}

impl License {
    pub fn execute(self) -> Result<()> {
        let cdm = self.cdm.load()?;
        let ctx = Context::new(self.source.config())?;
        let acquisition = Pipeline::new(&ctx, &cdm).acquire()?;

        for key in &acquisition.keys {
            println!(
                "[{}] {}:{}",
                key.key_type.to_string().green(),
                key.kid,
                hex::encode(&key.key)
            );
        }

        println!("{} {}", "--key".bold(), acquisition.selected);
        Ok(())
    }
}
