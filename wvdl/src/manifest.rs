use crate::{Context, Error, Result};
use log::{debug, info, warn};
use regex::Regex;
use reqwest::{Url, header};
use std::sync::LazyLock;
use wvdl_mp4::{KeyId, PsshBox, SystemId};

static DEFAULT_KID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"cenc:default_KID\s*=\s*"(?P<kid>[0-9a-fA-F-]+)""#).unwrap()
});
static EMBEDDED_PSSH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<cenc:pssh[^>]*>\s*(?P<data>.*?)\s*</cenc:pssh>").unwrap()
});

/// Which `PSSH` box goes into the license challenge.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PsshPolicy {
    /// Always build the box from the manifest key id.
    #[default]
    Rebuild,
    /// Use the manifest's widevine box when there is one, build otherwise.
    PreferEmbedded,
}

/// A fetched DASH manifest, only scanned for its protection markers.
pub struct Manifest {
    url: Url,
    text: String,
}

impl Manifest {
    pub fn new(url: Url, text: String) -> Self {
        Self { url, text }
    }

    /// Single GET with the session cookies. Any failure is final.
    pub fn fetch(ctx: &Context) -> Result<Self> {
        let url = &ctx.config.mpd_url;
        let unavailable = |reason: String| Error::ManifestUnavailable {
            url: url.to_string(),
            reason,
        };

        info!("Fetching manifest {}", url);

        let response = ctx
            .client
            .get(url.clone())
            .header(header::COOKIE, &ctx.cookie_header)
            .send()
            .map_err(|x| unavailable(x.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            return Err(unavailable(format!("server responded with {}", status)));
        }

        let url = response.url().to_owned();
        let text = response.text().map_err(|x| unavailable(x.to_string()))?;
        debug!("Manifest is {} bytes", text.len());
        Ok(Self { url, text })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// First `cenc:default_KID` attribute value.
    pub fn default_kid(&self) -> Result<KeyId> {
        let mut values = DEFAULT_KID
            .captures_iter(&self.text)
            .map(|x| x["kid"].to_owned());
        let first = values.next().ok_or(Error::KeyIdNotFound)?;
        let kid = first.parse::<KeyId>()?;

        for other in values {
            if other.parse::<KeyId>().is_ok_and(|x| x != kid) {
                warn!(
                    "Manifest lists more than one default KID, using {}",
                    kid.uuid()
                );
                break;
            }
        }

        Ok(kid)
    }

    /// First `<cenc:pssh>` element holding a widevine box.
    pub fn embedded_pssh(&self) -> Option<PsshBox> {
        for captures in EMBEDDED_PSSH.captures_iter(&self.text) {
            match PsshBox::from_base64(&captures["data"]) {
                Ok(x) if x.system_id() == SystemId::Widevine => return Some(x),
                Ok(x) => debug!("Skipping {} pssh box", x.system_id()),
                Err(e) => debug!("Skipping undecodable pssh box: {}", e),
            }
        }

        None
    }

    /// Box sent to the cdm for `kid`.
    pub fn resolve_pssh(&self, kid: &KeyId, policy: PsshPolicy) -> PsshBox {
        if policy == PsshPolicy::PreferEmbedded {
            if let Some(pssh) = self.embedded_pssh() {
                if !pssh.key_ids().contains(kid) {
                    warn!(
                        "Embedded pssh box does not list default KID {}",
                        kid.uuid()
                    );
                }

                info!("Using embedded pssh box");
                return pssh;
            }

            info!("No embedded widevine pssh box, building one");
        }

        PsshBox::widevine(kid)
    }
}
