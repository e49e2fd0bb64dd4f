//! Generate the elfboot configuration cache.

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::{Path, PathBuf};

use elfboot_build::{generate_file, AutoConf, AUTO_CONF};

/// Generate the configuration cache `auto.conf` for make.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(short, long)]
    ifile: PathBuf,
    /// Configuration cache.
    #[arg(short, long, default_value = AUTO_CONF)]
    ofile: PathBuf,
}

/// Build output line.
fn progress(ofile: &Path) -> String {
    format!("  BUILTIN {}", ofile.display())
}

fn main() -> Result<()> {
    env_logger::builder().filter_level(LevelFilter::Warn).parse_default_env().init();

    let args = Args::parse();

    println!("{}", progress(&args.ofile));

    generate_file(&args.ifile, &args.ofile, &AutoConf).with_context(|| {
        format!("cannot generate {} from {}", args.ofile.display(), args.ifile.display())
    })?;

    Ok(())
}
