use super::options::{CdmOptions, DownloadOptions, SourceOptions};
use crate::{Context, download::Orchestrator, pipeline::Pipeline};
use anyhow::Result;
use clap::Args;
use log::info;

/// Acquire the content key and download, decrypt and mux the stream.
#[derive(Args, Clone, Debug)]
pub struct Run {
    #[command(flatten)]
    source: SourceOptions,

    #[command(flatten)]
    cdm: CdmOptions,

    #[command(flatten)]
    download: DownloadOptions,
}

impl Run {
    pub fn execute(self) -> Result<()> {
        let download = self.download.config()?;
        let cdm = self.cdm.load()?;
        let ctx = Context::new(self.source.config())?;

        let report = Pipeline::new(&ctx, &cdm).run(&Orchestrator::new(download))?;
        info!("Done {}", report.output.display());
        Ok(())
    }
}
