use crate::{
    Context, Error, Result,
    cdm::{Cdm, ContentKey, SessionId},
    context::error_body,
};
use log::{debug, info, warn};
use reqwest::StatusCode;
use wvdl_mp4::PsshBox;

/// Header carrying the auth token on license requests.
pub const AUTH_TOKEN_HEADER: &str = "x-dt-auth-token";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SessionState {
    Open,
    ChallengeIssued,
    LicenseParsed,
    Closed,
}

/// An open cdm session, closed when dropped.
struct Session<'a, C: Cdm + ?Sized> {
    cdm: &'a C,
    id: SessionId,
    state: SessionState,
}

impl<'a, C: Cdm + ?Sized> Session<'a, C> {
    fn open(cdm: &'a C) -> Result<Self> {
        let id = cdm.open().map_err(|x| Error::CdmSession(x.0))?;
        debug!("Session {} open", id);

        Ok(Self {
            cdm,
            id,
            state: SessionState::Open,
        })
    }

    fn challenge(&mut self, pssh: &PsshBox) -> Result<Vec<u8>> {
        debug_assert_eq!(self.state, SessionState::Open);

        let challenge = self
            .cdm
            .challenge(&self.id, pssh)
            .map_err(|x| Error::ChallengeGenerationFailed(x.0))?;
        self.state = SessionState::ChallengeIssued;
        Ok(challenge)
    }

    fn parse_license(&mut self, license: &[u8]) -> Result<Vec<ContentKey>> {
        debug_assert_eq!(self.state, SessionState::ChallengeIssued);

        self.cdm
            .parse_license(&self.id, license)
            .map_err(|x| Error::LicenseParseFailed(x.0))?;
        self.state = SessionState::LicenseParsed;
        self.cdm
            .keys(&self.id)
            .map_err(|x| Error::LicenseParseFailed(x.0))
    }

    fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        match self.cdm.close(&self.id) {
            Ok(()) => debug!("Session {} closed", self.id),
            Err(e) => warn!("Could not close cdm session {}: {}", self.id, e),
        }

        self.state = SessionState::Closed;
    }
}

impl<C: Cdm + ?Sized> Drop for Session<'_, C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Single shot license round trip on one cdm session.
pub struct LicenseClient<'a, C: Cdm + ?Sized> {
    ctx: &'a Context,
    cdm: &'a C,
}

impl<'a, C: Cdm + ?Sized> LicenseClient<'a, C> {
    pub fn new(ctx: &'a Context, cdm: &'a C) -> Self {
        Self { ctx, cdm }
    }

    /// Exchange `pssh` for the keys of its license.
    ///
    /// The session is closed on every return path and the request is never
    /// retried; a rejected license usually means the auth token expired.
    pub fn acquire(&self, pssh: &PsshBox, auth_token: &str) -> Result<Vec<ContentKey>> {
        let mut session = Session::open(self.cdm)?;
        let challenge = session.challenge(pssh)?;
        let license = self.request_license(challenge, auth_token)?;
        let keys = session.parse_license(&license)?;
        session.close();

        info!("License released {} key(s)", keys.len());
        Ok(keys)
    }

    fn request_license(&self, challenge: Vec<u8>, auth_token: &str) -> Result<Vec<u8>> {
        let url = &self.ctx.config.license_url;
        info!("Requesting license from {}", url);

        let response = self
            .ctx
            .client
            .post(url.clone())
            .header(AUTH_TOKEN_HEADER, auth_token)
            .body(challenge)
            .send()
            .map_err(Error::LicenseUnreachable)?;
        let status = response.status();

        if status != StatusCode::OK {
            return Err(Error::LicenseRequestFailed {
                status: status.as_u16(),
                body: error_body(response),
            });
        }

        Ok(response
            .bytes()
            .map_err(Error::LicenseUnreachable)?
            .to_vec())
    }
}
