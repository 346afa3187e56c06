use crate::{
    Context, Result, auth,
    cdm::{Cdm, ContentKey},
    download::{DownloadReport, Orchestrator},
    license::LicenseClient,
    manifest::Manifest,
    selector::{self, SelectedKey},
};
use log::info;
use wvdl_mp4::{KeyId, PsshBox};

/// Everything learned before the download starts.
#[derive(Debug)]
pub struct Acquisition {
    pub kid: KeyId,
    pub pssh: PsshBox,
    pub keys: Vec<ContentKey>,
    pub selected: SelectedKey,
}

/// Manifest → pssh → auth token → license → key → download, strictly in order.
pub struct Pipeline<'a, C: Cdm + ?Sized> {
    ctx: &'a Context,
    cdm: &'a C,
}

impl<'a, C: Cdm + ?Sized> Pipeline<'a, C> {
    pub fn new(ctx: &'a Context, cdm: &'a C) -> Self {
        Self { ctx, cdm }
    }

    pub fn acquire(&self) -> Result<Acquisition> {
        let manifest = Manifest::fetch(self.ctx)?;
        let kid = manifest.default_kid()?;
        info!("Default KID {}", kid.uuid());

        let pssh = manifest.resolve_pssh(&kid, self.ctx.config.pssh_policy);
        info!("PSSH {}", pssh.to_base64());

        let auth_token = auth::fetch_auth_token(self.ctx)?;
        let keys = LicenseClient::new(self.ctx, self.cdm).acquire(&pssh, &auth_token)?;
        let selected = selector::select(&keys)?;
        info!("Selected key {}", selected);

        Ok(Acquisition {
            kid,
            pssh,
            keys,
            selected,
        })
    }

    pub fn run(&self, orchestrator: &Orchestrator) -> Result<DownloadReport> {
        let acquisition = self.acquire()?;
        let job = orchestrator.job(
            self.ctx.config.mpd_url.clone(),
            self.ctx.cookie_header.clone(),
            acquisition.selected,
        );
        orchestrator.run(&job)
    }
}
