//! Configure elfboot stages by patching symbol values of their ELF images.

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::{
    fs::{self, File},
    io::{Seek, SeekFrom, Write},
    num::ParseIntError,
    path::{Path, PathBuf},
};

mod elf32;

/// Patch the value of a symbol in a 32-bit ELF image.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ELF image to modify.
    #[arg(short, long)]
    file: PathBuf,
    /// Name of the symbol to modify.
    #[arg(short, long)]
    symbol: String,
    /// Value to write to the symbol.
    #[arg(short, long, value_parser = parse_number)]
    value: u64,
}

/// Parses a decimal, `0x` hexadecimal or `0` octal number.
fn parse_number(s: &str) -> Result<u64, ParseIntError> {
    let lower = s.to_ascii_lowercase();
    match lower.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None if lower.len() > 1 && lower.starts_with('0') => u64::from_str_radix(&lower[1..], 8),
        None => lower.parse::<u64>(),
    }
}

/// Patches the symbol in the ELF file in place.
///
/// Returns the file offset of the patched bytes.
fn configure(path: &Path, symbol: &str, value: u64) -> Result<u64> {
    let mut image = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let range = elf32::patch(&mut image, symbol, value)
        .with_context(|| format!("cannot set symbol {symbol} in {}", path.display()))?;
    let offset = range.start as u64;
    log::info!("symbol {symbol} occupies {} bytes at file offset 0x{offset:x}", range.len());

    // Only the symbol bytes are written back.
    let mut file = File::options().write(true).open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&image[range])?;
    file.flush()?;

    Ok(offset)
}

fn main() -> Result<()> {
    env_logger::builder().filter_level(LevelFilter::Warn).parse_default_env().init();

    let args = Args::parse();

    let offset = configure(&args.file, &args.symbol, args.value)?;

    eprintln!("{}: {} = 0x{:x} @ 0x{offset:x}", args.file.display(), args.symbol, args.value);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::LE;

    #[test]
    fn parses_numbers() {
        assert_eq!(parse_number("4096"), Ok(4096));
        assert_eq!(parse_number("0x7C00"), Ok(0x7c00));
        assert_eq!(parse_number("0755"), Ok(0o755));
        assert_eq!(parse_number("0"), Ok(0));
        assert!(parse_number("0x").is_err());
        assert!(parse_number("09").is_err());
        assert!(parse_number("-1").is_err());
    }

    #[test]
    fn configures_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stage1.elf");
        let original = elf32::tests::image::<LE>(1);
        fs::write(&path, &original).unwrap();

        let offset = configure(&path, "stage_addr", 0xcafe).unwrap() as usize;

        let patched = fs::read(&path).unwrap();
        assert_eq!(patched.len(), original.len());
        assert_eq!(&patched[offset..offset + 4], &[0xfe, 0xca, 0, 0]);
        assert_eq!(&patched[..offset], &original[..offset]);
        assert_eq!(&patched[offset + 4..], &original[offset + 4..]);
    }

    #[test]
    fn leaves_file_untouched_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stage2.elf");
        let original = elf32::tests::image::<LE>(1);
        fs::write(&path, &original).unwrap();

        assert!(configure(&path, "no_such_symbol", 1).is_err());
        assert_eq!(fs::read(&path).unwrap(), original);
    }
}
