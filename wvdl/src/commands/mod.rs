mod license;
mod options;
mod pssh;
mod run;

pub use license::License;
pub use pssh::Pssh;
pub use run::Run;

use clap::{ColorChoice, Parser, Subcommand};
use log::LevelFilter;

/// Acquire Widevine content keys for a DASH stream and download it with N_m3u8DL-RE.
///
/// Every option can also be given through the environment or a .env file in
/// the working directory.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// When to output colored text.
    #[arg(long, global = true, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Only print warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print debug messages with their source location.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Warn
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    License(License),
    Pssh(Pssh),
    Run(Run),
}

impl Commands {
    pub fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::License(args) => args.execute(),
            Self::Pssh(args) => args.execute(),
            Self::Run(args) => args.execute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn parses_pssh_command() {
        let args = Args::try_parse_from(["wvdl", "-v", "pssh", "ab12cd34ef5601234567890abcdef0ef"])
            .unwrap();
        assert_eq!(args.log_level(), LevelFilter::Debug);
        assert!(matches!(args.command, Commands::Pssh(_)));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Args::try_parse_from(["wvdl", "-q", "-v", "pssh", "00"]).is_err());
    }
}
