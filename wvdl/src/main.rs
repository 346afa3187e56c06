use clap::{ColorChoice, Parser};
use colored::Colorize;
use std::{
    io::{IsTerminal, stderr},
    process,
};
use wvdl::{Args, logger::Logger};

fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    colored::control::set_override(match args.color {
        ColorChoice::Always => true,
        ColorChoice::Auto => stderr().is_terminal(),
        ColorChoice::Never => false,
    });

    Logger::init(args.log_level())?;
    args.command.execute()
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".bold().red(), e);
        process::exit(1);
    }
}
