//! elfboot build tools.
//!
//! Translates a `NAME=value` configuration file into the configuration cache
//! (`auto.conf`) for make and into a C configuration header.

use displaydoc::Display;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};
use thiserror::Error;

pub mod config;
pub mod format;

pub use config::{parse_line, Assignment, Value};
pub use format::{AutoConf, Format, Header, DEFAULT_GUARD};

/// Default name of the configuration cache.
pub const AUTO_CONF: &str = "auto.conf";

/// Error generating a configuration file.
#[derive(Display, Error, Debug)]
pub enum Error {
    /// I/O error
    Io(#[from] io::Error),
    /// more than one `=` in assignment
    MultipleSeparators,
    /// line {line}
    Line {
        /// Line number, starting at 1.
        line: usize,
        /// Error on this line.
        source: Box<Error>,
    },
}

/// Generates a configuration file from configuration lines.
///
/// Returns the number of emitted assignments.
/// Generation stops at the first malformed line, leaving the output incomplete.
pub fn generate(mut input: impl BufRead, mut output: impl Write, format: &dyn Format) -> Result<usize, Error> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;

    format.prologue(&mut output)?;

    let mut emitted = 0;
    for (no, line) in config::lines(&text).enumerate() {
        let assignment =
            parse_line(line).map_err(|err| Error::Line { line: no + 1, source: Box::new(err) })?;

        match assignment {
            Some(assignment) => {
                log::trace!("line {}: {} = {:?}", no + 1, assignment.name, assignment.value());
                format.assignment(&mut output, &assignment)?;
                emitted += 1;
            }
            None => log::trace!("line {}: skipped", no + 1),
        }
    }

    format.epilogue(&mut output)?;
    Ok(emitted)
}

/// Generates the configuration file `ofile` from the configuration file `ifile`.
///
/// The input is opened before the output is created.
pub fn generate_file(ifile: &Path, ofile: &Path, format: &dyn Format) -> Result<usize, Error> {
    let input = BufReader::new(File::open(ifile)?);
    let mut output = BufWriter::new(File::create(ofile)?);

    let emitted = generate(input, &mut output, format)?;
    output.flush()?;

    log::debug!("wrote {emitted} assignments from {} to {}", ifile.display(), ofile.display());
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EXAMPLE: &str = "FOO=y\n# comment\nBAR=n\nBAZ=hello\nQUX=m\n";

    fn run(input: &str, format: &dyn Format) -> Result<String, Error> {
        let mut out = Vec::new();
        generate(input.as_bytes(), &mut out, format)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn auto_conf_example() {
        let out = run(EXAMPLE, &AutoConf).unwrap();
        let body = out.strip_prefix(AutoConf::BANNER).unwrap();
        assert_eq!(body, "CONFIG_FOO=y\nCONFIG_BAR=n\nCONFIG_BAZ=hello\nCONFIG_QUX=m\n");
    }

    #[test]
    fn header_example() {
        let out = run(EXAMPLE, &Header::default()).unwrap();
        assert_eq!(
            out,
            "#ifndef __ELFBOOT_CONFIG_H__\n\
             #define __ELFBOOT_CONFIG_H__\n\
             \n\
             #define CONFIG_FOO\n\
             /* CONFIG_BAR is not defined */\n\
             #define CONFIG_BAZ hello\n\
             #define CONFIG_QUX m\n\
             \n\
             #endif /* __ELFBOOT_CONFIG_H__ */\n"
        );
    }

    #[test]
    fn empty_header_is_guarded_once() {
        for input in ["", "# only a comment\n\nno assignment here\n"] {
            let out = run(input, &Header::default()).unwrap();
            assert_eq!(
                out,
                "#ifndef __ELFBOOT_CONFIG_H__\n#define __ELFBOOT_CONFIG_H__\n\n\n#endif /* __ELFBOOT_CONFIG_H__ */\n"
            );
        }
    }

    #[test]
    fn preserves_order_and_counts() {
        let input = "C=3\nnoise\nA=1\n#B=2\nB=2\n";
        let mut out = Vec::new();
        let emitted = generate(input.as_bytes(), &mut out, &AutoConf).unwrap();
        assert_eq!(emitted, 3);

        let out = String::from_utf8(out).unwrap();
        let body: Vec<_> = out.strip_prefix(AutoConf::BANNER).unwrap().lines().collect();
        assert_eq!(body, ["CONFIG_C=3", "CONFIG_A=1", "CONFIG_B=2"]);
    }

    #[test]
    fn accepts_carriage_return_line_endings() {
        let out = run("FOO=y\rBAR=n\r", &AutoConf).unwrap();
        assert_eq!(out.strip_prefix(AutoConf::BANNER).unwrap(), "CONFIG_FOO=y\nCONFIG_BAR=n\n");

        let out = run("FOO=y\r\n# comment\rBAZ=hello\r\n", &Header::default()).unwrap();
        assert!(out.contains("\n#define CONFIG_FOO\n#define CONFIG_BAZ hello\n\n#endif"));
    }

    #[test]
    fn line_numbers_count_carriage_returns() {
        let err = run("A=y\rB=n\rC=1=2\r", &AutoConf).unwrap_err();
        assert!(matches!(err, Error::Line { line: 3, .. }));
        assert_eq!(err.to_string(), "line 3");
    }

    #[test]
    fn io_error_message_leaves_cause_to_source() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.to_string(), "I/O error");
        assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "gone");
    }

    #[test]
    fn malformed_line_aborts() {
        let mut out = Vec::new();
        let err = generate("A=y\nB=1=2\nC=y\n".as_bytes(), &mut out, &Header::default()).unwrap_err();
        match err {
            Error::Line { line, source } => {
                assert_eq!(line, 2);
                assert!(matches!(*source, Error::MultipleSeparators));
            }
            other => panic!("unexpected error: {other}"),
        }

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("#define CONFIG_A\n"));
        assert!(!out.contains("CONFIG_C"));
        assert!(!out.contains("#endif"));
    }

    #[test]
    fn generates_files() {
        let dir = tempfile::tempdir().unwrap();
        let ifile = dir.path().join(".config");
        let ofile = dir.path().join(AUTO_CONF);
        fs::write(&ifile, EXAMPLE).unwrap();

        assert_eq!(generate_file(&ifile, &ofile, &AutoConf).unwrap(), 4);
        let out = fs::read_to_string(&ofile).unwrap();
        assert!(out.starts_with(AutoConf::BANNER));
        assert!(out.ends_with("CONFIG_QUX=m\n"));
    }

    #[test]
    fn missing_input_creates_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let ofile = dir.path().join("config.h");

        let err = generate_file(&dir.path().join("missing"), &ofile, &Header::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!ofile.exists());
    }
}
