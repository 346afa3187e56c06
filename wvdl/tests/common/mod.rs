#![allow(dead_code)]

use httpmock::MockServer;
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    thread,
    time::Duration,
};
use wvdl::{
    Config, Context,
    cdm::{Cdm, CdmError, ContentKey, KeyType, SessionId},
    config::DEFAULT_HTTP_TIMEOUT,
    wvdl_mp4::{KeyId, PsshBox},
};

pub const MPD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" xmlns:cenc="urn:mpeg:cenc:2013" type="dynamic">
  <Period id="p0">
    <AdaptationSet mimeType="video/mp4" segmentAlignment="true">
      <ContentProtection schemeIdUri="urn:mpeg:dash:mp4protection:2011" value="cenc" cenc:default_KID="AB12CD34-EF56-0123-4567-890ABCDEF0EF"/>
      <ContentProtection schemeIdUri="urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed"/>
      <Representation id="v0" bandwidth="4000000" width="1920" height="1080"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

pub const KID_HEX: &str = "ab12cd34ef5601234567890abcdef0ef";
pub const AUTH_TOKEN: &str = "token-123";
pub const LICENSE: &str = "license-bytes";

/// Challenge the mock cdm produces for `pssh`.
pub fn challenge_for(pssh: &PsshBox) -> String {
    format!("challenge:{}", pssh.to_base64())
}

pub fn content_key(byte: u8, key_type: KeyType) -> ContentKey {
    ContentKey {
        kid: KeyId::from_bytes([byte; 16]),
        key_type,
        key: vec![byte; 16],
    }
}

/// In memory cdm recording every call.
pub struct MockCdm {
    keys: Vec<ContentKey>,
    pub fail_challenge: bool,
    next_id: Cell<u32>,
    open: RefCell<HashSet<SessionId>>,
    calls: RefCell<Vec<&'static str>>,
}

impl MockCdm {
    pub fn new(keys: Vec<ContentKey>) -> Self {
        Self {
            keys,
            fail_challenge: false,
            next_id: Cell::new(0),
            open: RefCell::new(HashSet::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn open_sessions(&self) -> usize {
        self.open.borrow().len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn check(&self, session: &SessionId) -> Result<(), CdmError> {
        if self.open.borrow().contains(session) {
            Ok(())
        } else {
            Err(CdmError::new(format!("session {} is not open", session)))
        }
    }
}

impl Cdm for MockCdm {
    fn open(&self) -> Result<SessionId, CdmError> {
        self.calls.borrow_mut().push("open");
        let id = SessionId(format!("session-{}", self.next_id.get()));
        self.next_id.set(self.next_id.get() + 1);
        self.open.borrow_mut().insert(id.clone());
        Ok(id)
    }

    fn challenge(&self, session: &SessionId, pssh: &PsshBox) -> Result<Vec<u8>, CdmError> {
        self.calls.borrow_mut().push("challenge");
        self.check(session)?;

        if self.fail_challenge {
            return Err(CdmError::new("device certificate revoked"));
        }

        Ok(challenge_for(pssh).into_bytes())
    }

    fn parse_license(&self, session: &SessionId, license: &[u8]) -> Result<(), CdmError> {
        self.calls.borrow_mut().push("parse_license");
        self.check(session)?;

        if license != LICENSE.as_bytes() {
            return Err(CdmError::new("signature mismatch"));
        }

        Ok(())
    }

    fn keys(&self, session: &SessionId) -> Result<Vec<ContentKey>, CdmError> {
        self.calls.borrow_mut().push("keys");
        self.check(session)?;
        Ok(self.keys.clone())
    }

    fn close(&self, session: &SessionId) -> Result<(), CdmError> {
        self.calls.borrow_mut().push("close");

        if self.open.borrow_mut().remove(session) {
            Ok(())
        } else {
            Err(CdmError::new(format!("session {} is not open", session)))
        }
    }
}

/// Context pointing every endpoint at `server`.
pub fn context(server: &MockServer) -> Context {
    context_at(&server.base_url(), DEFAULT_HTTP_TIMEOUT)
}

pub fn context_at(base_url: &str, http_timeout: Duration) -> Context {
    let mut config = Config::new(
        format!("{}/live.mpd", base_url).parse().unwrap(),
        "sid=abc",
        format!("{}/auth", base_url).parse().unwrap(),
    );
    config.license_url = format!("{}/license", base_url).parse().unwrap();
    config.http_timeout = http_timeout;
    Context::new(config).unwrap()
}

/// Server answering every request with `status` and a body that ends before
/// its announced length.
pub fn truncated_body_server(status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else {
                continue;
            };
            let mut reader = BufReader::new(stream);
            let mut content_length = 0;

            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }

            let mut body = vec![0; content_length];
            let _ = reader.read_exact(&mut body);
            let mut stream = reader.into_inner();
            let _ = write!(
                stream,
                "HTTP/1.1 {}\r\ncontent-length: 100\r\nconnection: close\r\n\r\ncut",
                status
            );
        }
    });

    format!("http://{}", addr)
}
