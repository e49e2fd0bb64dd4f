//! Output formats for configuration assignments.

use std::io::{Result, Write};

use crate::config::{Assignment, Value, PREFIX};

/// Include guard of the generated configuration header.
pub const DEFAULT_GUARD: &str = "__ELFBOOT_CONFIG_H__";

/// Output format of a generated configuration file.
pub trait Format {
    /// Writes everything preceding the first assignment.
    fn prologue(&self, out: &mut dyn Write) -> Result<()>;

    /// Writes exactly one line for the assignment.
    fn assignment(&self, out: &mut dyn Write, assignment: &Assignment) -> Result<()>;

    /// Writes everything following the last assignment.
    fn epilogue(&self, out: &mut dyn Write) -> Result<()>;
}

/// Configuration cache (`auto.conf`) for inclusion by make.
#[derive(Debug, Clone, Default)]
pub struct AutoConf;

impl AutoConf {
    /// Generation notice written before the assignments.
    pub const BANNER: &'static str = "\
# This file is automatically created with:
# builtin = $(BUILTIN) -i $(1)
#
# Do NOT change this file manually!

";
}

impl Format for AutoConf {
    fn prologue(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(Self::BANNER.as_bytes())
    }

    fn assignment(&self, out: &mut dyn Write, assignment: &Assignment) -> Result<()> {
        let name = assignment.name;
        match assignment.value() {
            Value::Yes => writeln!(out, "{PREFIX}{name}=y"),
            Value::Module => writeln!(out, "{PREFIX}{name}=m"),
            Value::No | Value::Other(_) => writeln!(out, "{PREFIX}{name}={}", assignment.raw),
        }
    }

    fn epilogue(&self, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }
}

/// C preprocessor header.
#[derive(Debug, Clone)]
pub struct Header {
    guard: String,
}

impl Header {
    /// Creates a header format using the specified include guard.
    pub fn new(guard: impl Into<String>) -> Self {
        Self { guard: guard.into() }
    }

    /// Include guard.
    pub fn guard(&self) -> &str {
        &self.guard
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(DEFAULT_GUARD)
    }
}

impl Format for Header {
    fn prologue(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "#ifndef {}", self.guard)?;
        writeln!(out, "#define {}", self.guard)?;
        writeln!(out)
    }

    fn assignment(&self, out: &mut dyn Write, assignment: &Assignment) -> Result<()> {
        let name = assignment.name;
        match assignment.value() {
            Value::No => writeln!(out, "/* {PREFIX}{name} is not defined */"),
            Value::Yes => writeln!(out, "#define {PREFIX}{name}"),
            Value::Module | Value::Other(_) => writeln!(out, "#define {PREFIX}{name} {}", assignment.raw),
        }
    }

    fn epilogue(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out)?;
        writeln!(out, "#endif /* {} */", self.guard)
    }
}
