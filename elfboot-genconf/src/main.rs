//! Generate the elfboot configuration header.

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::{Path, PathBuf};

use elfboot_build::{generate_file, Header, DEFAULT_GUARD};

/// Generate the C configuration header.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(short, long)]
    ifile: PathBuf,
    /// Header file.
    #[arg(short, long)]
    ofile: PathBuf,
    /// Include guard.
    #[arg(long, env = "ELFBOOT_CONFIG_GUARD", default_value = DEFAULT_GUARD)]
    guard: String,
}

/// Build output line.
fn progress(ofile: &Path) -> String {
    format!("  GENCONF {}", ofile.display())
}

fn main() -> Result<()> {
    env_logger::builder().filter_level(LevelFilter::Warn).parse_default_env().init();

    let args = Args::parse();

    println!("{}", progress(&args.ofile));

    let header = Header::new(args.guard);
    let emitted = generate_file(&args.ifile, &args.ofile, &header).with_context(|| {
        format!("cannot generate {} from {}", args.ofile.display(), args.ifile.display())
    })?;
    log::info!("{emitted} configuration macros guarded by {}", header.guard());

    Ok(())
}
