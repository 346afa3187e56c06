use super::{Cdm, CdmError, ContentKey, SessionId};
use crate::{Error, Result};
use log::{debug, info};
use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::Path,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicU32, Ordering},
    },
};
use widevine::{CdmLicenseRequest, CdmSession, Device, KeySet, KeyType, LicenseType, Pssh};
use wvdl_mp4::{KeyId, PsshBox};

const MAX_SESSIONS: usize = 16;

/// Order in which license keys are reported.
const KEY_TYPES: [KeyType; 6] = [
    KeyType::SIGNING,
    KeyType::CONTENT,
    KeyType::KEY_CONTROL,
    KeyType::OPERATOR_SESSION,
    KeyType::ENTITLEMENT,
    KeyType::OEM_CONTENT,
];

enum Slot {
    Open(CdmSession),
    Requested(CdmLicenseRequest),
    Licensed(KeySet),
    Failed,
}

impl Slot {
    fn name(&self) -> &'static str {
        match self {
            Self::Open(_) => "open",
            Self::Requested(_) => "waiting for a license",
            Self::Licensed(_) => "licensed",
            Self::Failed => "failed",
        }
    }
}

/// In process cdm signing challenges with the private key of a `.wvd` device.
pub struct LocalCdm {
    cdm: widevine::Cdm,
    next_id: AtomicU32,
    sessions: Mutex<HashMap<SessionId, Slot>>,
}

impl LocalCdm {
    pub fn new(device: Device) -> Self {
        Self {
            cdm: widevine::Cdm::new(device),
            next_id: AtomicU32::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Load a pywidevine `.wvd` device file (v1 or v2).
    pub fn from_wvd<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let device_load = |reason: String| Error::DeviceLoad {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|x| device_load(x.to_string()))?;
        let device =
            Device::read_wvd(BufReader::new(file)).map_err(|x| device_load(x.to_string()))?;

        info!(
            "Loaded {:?} {:?} widevine device from {}",
            device.device_type(),
            device.security_level(),
            path.display()
        );
        Ok(Self::new(device))
    }

    pub fn device(&self) -> &Device {
        self.cdm.device()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Slot>> {
        self.sessions.lock().unwrap_or_else(|x| x.into_inner())
    }

    fn take(&self, session: &SessionId) -> std::result::Result<Slot, CdmError> {
        self.sessions()
            .remove(session)
            .ok_or_else(|| CdmError::new(format!("session {} is not open", session)))
    }

    fn put(&self, session: &SessionId, slot: Slot) {
        self.sessions().insert(session.clone(), slot);
    }

    fn misuse(&self, session: &SessionId, slot: Slot, call: &str) -> CdmError {
        let error = CdmError::new(format!(
            "session {} is {}, {} is not allowed",
            session,
            slot.name(),
            call
        ));
        self.put(session, slot);
        error
    }
}

impl Cdm for LocalCdm {
    fn open(&self) -> std::result::Result<SessionId, CdmError> {
        let mut sessions = self.sessions();

        if sessions.len() >= MAX_SESSIONS {
            return Err(CdmError::new(format!(
                "too many open sessions ({})",
                MAX_SESSIONS
            )));
        }

        let id = SessionId(format!(
            "{:08x}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));
        sessions.insert(id.clone(), Slot::Open(self.cdm.open()));
        debug!("opened cdm session {}", id);
        Ok(id)
    }

    fn challenge(
        &self,
        session: &SessionId,
        pssh: &PsshBox,
    ) -> std::result::Result<Vec<u8>, CdmError> {
        let cdm_session = match self.take(session)? {
            Slot::Open(x) => x,
            slot => return Err(self.misuse(session, slot, "challenge")),
        };

        let request = Pssh::from_bytes(pssh.as_bytes())
            .and_then(|x| cdm_session.get_license_request(x, LicenseType::STREAMING))
            .and_then(|x| x.challenge().map(|challenge| (x, challenge)));

        match request {
            Ok((request, challenge)) => {
                self.put(session, Slot::Requested(request));
                Ok(challenge)
            }
            Err(e) => {
                self.put(session, Slot::Failed);
                Err(CdmError::new(e.to_string()))
            }
        }
    }

    fn parse_license(
        &self,
        session: &SessionId,
        license: &[u8],
    ) -> std::result::Result<(), CdmError> {
        let request = match self.take(session)? {
            Slot::Requested(x) => x,
            slot => return Err(self.misuse(session, slot, "parse_license")),
        };

        match request.get_keys(license) {
            Ok(keys) => {
                self.put(session, Slot::Licensed(keys));
                Ok(())
            }
            Err(e) => {
                self.put(session, Slot::Failed);
                Err(CdmError::new(e.to_string()))
            }
        }
    }

    fn keys(&self, session: &SessionId) -> std::result::Result<Vec<ContentKey>, CdmError> {
        let sessions = self.sessions();

        let Some(slot) = sessions.get(session) else {
            return Err(CdmError::new(format!("session {} is not open", session)));
        };
        let Slot::Licensed(keys) = slot else {
            return Err(CdmError::new(format!(
                "session {} is {}, keys is not allowed",
                session,
                slot.name()
            )));
        };

        Ok(KEY_TYPES
            .iter()
            .flat_map(|x| keys.of_type(*x))
            .map(|x| ContentKey {
                kid: KeyId::from_bytes(x.kid),
                key_type: x.typ.into(),
                key: x.key.clone(),
            })
            .collect())
    }

    fn close(&self, session: &SessionId) -> std::result::Result<(), CdmError> {
        self.take(session)?;
        debug!("closed cdm session {}", session);
        Ok(())
    }
}
