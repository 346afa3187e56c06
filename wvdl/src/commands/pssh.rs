use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use wvdl_mp4::{KeyId, PsshBox};

/// Build the widevine pssh box of a KID, or inspect a base64 encoded pssh box.
#[derive(Args, Clone, Debug)]
pub struct Pssh {
    #[arg(required = true, value_name = "KID|BASE64")]
    input: String,
}

impl Pssh {
    pub fn execute(self) -> Result<()> {
        if let Ok(kid) = self.input.parse::<KeyId>() {
            let pssh = PsshBox::widevine(&kid);
            println!("{} {}", "base64".bold(), pssh.to_base64());
            println!("{} {}", "hex".bold(), hex::encode(pssh.as_bytes()));
            return Ok(());
        }

        let pssh = match PsshBox::from_base64(&self.input) {
            Ok(x) => x,
            Err(e) => bail!(
                "'{}' is neither a 32 digit KID nor a base64 pssh box ({}).",
                self.input,
                e
            ),
        };

        println!("{} {}", "system".bold(), pssh.system_id());
        println!("{} {}", "version".bold(), pssh.version());

        for kid in pssh.key_ids() {
            println!("{} {}", "kid".bold(), kid.uuid());
        }

        Ok(())
    }
}
