//! 32-bit ELF symbol patching.

use byteorder::{ByteOrder, BE, LE};
use displaydoc::Display;
use std::ops::Range;
use thiserror::Error;

/// Error patching an ELF image.
#[derive(Display, Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// not an ELF image
    NotElf,
    /// unsupported ELF class {0}, only 32-bit images are supported
    UnsupportedClass(u8),
    /// unsupported ELF data encoding {0}
    UnsupportedEncoding(u8),
    /// ELF image is truncated
    Truncated,
    /// section {0} is missing
    MissingSection(&'static str),
    /// symbol {0} not found
    SymbolNotFound(String),
    /// symbol {0} has no location in the image
    UnplaceableSymbol(String),
    /// symbol {name} has unsupported size {size}
    UnsupportedSize {
        /// Symbol name.
        name: String,
        /// Symbol size in bytes.
        size: u32,
    },
    /// value 0x{value:x} does not fit into {size} bytes
    ValueTooLarge {
        /// Value to write.
        value: u64,
        /// Symbol size in bytes.
        size: u32,
    },
}

const MAGIC: &[u8] = b"\x7fELF";
const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const ELFCLASS32: u8 = 1;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;

const SHN_UNDEF: u16 = 0;
const SHN_LORESERVE: u16 = 0xff00;

const SYMTAB: &str = ".symtab";
const STRTAB: &str = ".strtab";

/// Byte order of an ELF image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    /// Little endian.
    Little,
    /// Big endian.
    Big,
}

/// Section header.
#[derive(Debug, Clone, Copy, Default)]
struct Section {
    name: u32,
    addr: u32,
    offset: u32,
    size: u32,
    entsize: u32,
}

/// Symbol table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Symbol value (virtual address).
    pub value: u32,
    /// Size in bytes.
    pub size: u32,
    /// Index of the section the symbol is defined in.
    pub shndx: u16,
}

/// Parsed 32-bit ELF image.
pub struct Elf32<'a> {
    data: &'a [u8],
    endian: Endian,
    sections: Vec<Section>,
    shstrtab: Section,
    symtab: Section,
    strtab: Section,
}

impl<'a> Elf32<'a> {
    /// Parses the ELF header and locates the symbol and string tables.
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        if !data.starts_with(MAGIC) {
            return Err(Error::NotElf);
        }

        let class = *data.get(EI_CLASS).ok_or(Error::Truncated)?;
        if class != ELFCLASS32 {
            return Err(Error::UnsupportedClass(class));
        }

        let endian = match *data.get(EI_DATA).ok_or(Error::Truncated)? {
            ELFDATA2LSB => Endian::Little,
            ELFDATA2MSB => Endian::Big,
            other => return Err(Error::UnsupportedEncoding(other)),
        };

        let mut elf = Self {
            data,
            endian,
            sections: Vec::new(),
            shstrtab: Section::default(),
            symtab: Section::default(),
            strtab: Section::default(),
        };

        // Dissect header.
        let shoff = elf.u32_at(32)? as usize;
        let shentsize = elf.u16_at(46)? as usize;
        let shnum = elf.u16_at(48)? as usize;
        let shstrndx = elf.u16_at(50)? as usize;

        elf.sections =
            (0..shnum).map(|n| elf.section_at(shoff + n * shentsize)).collect::<Result<_, Error>>()?;
        elf.shstrtab = *elf.sections.get(shstrndx).ok_or(Error::MissingSection(".shstrtab"))?;
        elf.symtab = elf.find_section(SYMTAB)?;
        elf.strtab = elf.find_section(STRTAB)?;

        log::debug!(
            "{endian:?} endian ELF32 image with {shnum} sections and {} symbols",
            elf.symbol_count()
        );

        Ok(elf)
    }

    fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], Error> {
        let end = offset.checked_add(len).ok_or(Error::Truncated)?;
        self.data.get(offset..end).ok_or(Error::Truncated)
    }

    fn u16_at(&self, offset: usize) -> Result<u16, Error> {
        let buf = self.bytes(offset, 2)?;
        Ok(match self.endian {
            Endian::Little => LE::read_u16(buf),
            Endian::Big => BE::read_u16(buf),
        })
    }

    fn u32_at(&self, offset: usize) -> Result<u32, Error> {
        let buf = self.bytes(offset, 4)?;
        Ok(match self.endian {
            Endian::Little => LE::read_u32(buf),
            Endian::Big => BE::read_u32(buf),
        })
    }

    fn section_at(&self, offset: usize) -> Result<Section, Error> {
        Ok(Section {
            name: self.u32_at(offset)?,
            addr: self.u32_at(offset + 12)?,
            offset: self.u32_at(offset + 16)?,
            size: self.u32_at(offset + 20)?,
            entsize: self.u32_at(offset + 36)?,
        })
    }

    /// Reads a NUL-terminated string from a string table.
    fn str_at(&self, table: &Section, index: u32) -> Result<&'a [u8], Error> {
        let table = self.bytes(table.offset as usize, table.size as usize)?;
        let s = table.get(index as usize..).ok_or(Error::Truncated)?;
        let len = s.iter().position(|&b| b == 0).ok_or(Error::Truncated)?;
        Ok(&s[..len])
    }

    fn find_section(&self, name: &'static str) -> Result<Section, Error> {
        for section in &self.sections {
            if self.str_at(&self.shstrtab, section.name)? == name.as_bytes() {
                return Ok(*section);
            }
        }
        Err(Error::MissingSection(name))
    }

    fn symbol_count(&self) -> usize {
        match self.symtab.entsize {
            0 => 0,
            entsize => (self.symtab.size / entsize) as usize,
        }
    }

    /// Finds a defined symbol by name.
    ///
    /// Only the first symbol with the specified name is considered.
    pub fn find_symbol(&self, name: &str) -> Result<Symbol, Error> {
        for n in 0..self.symbol_count() {
            let offset = self.symtab.offset as usize + n * self.symtab.entsize as usize;
            if self.str_at(&self.strtab, self.u32_at(offset)?)? != name.as_bytes() {
                continue;
            }

            let symbol = Symbol {
                value: self.u32_at(offset + 4)?,
                size: self.u32_at(offset + 8)?,
                shndx: self.u16_at(offset + 14)?,
            };
            if symbol.shndx == SHN_UNDEF {
                break;
            }
            return Ok(symbol);
        }
        Err(Error::SymbolNotFound(name.to_string()))
    }

    /// Offset of the symbol's data within the image.
    pub fn symbol_offset(&self, name: &str, symbol: &Symbol) -> Result<usize, Error> {
        let unplaceable = || Error::UnplaceableSymbol(name.to_string());
        if symbol.shndx >= SHN_LORESERVE {
            return Err(unplaceable());
        }
        let section = self.sections.get(symbol.shndx as usize).ok_or_else(unplaceable)?;

        let offset = symbol
            .value
            .checked_sub(section.addr)
            .and_then(|rel| rel.checked_add(section.offset))
            .ok_or_else(unplaceable)? as usize;
        self.bytes(offset, symbol.size as usize)?;
        Ok(offset)
    }

    /// Encodes a value for storage in the symbol.
    pub fn encode(&self, name: &str, symbol: &Symbol, value: u64) -> Result<Vec<u8>, Error> {
        let size = symbol.size;
        if size == 0 || size > 8 {
            return Err(Error::UnsupportedSize { name: name.to_string(), size });
        }
        if size < 8 && value >> (size * 8) != 0 {
            return Err(Error::ValueTooLarge { value, size });
        }

        let mut buf = vec![0; size as usize];
        match self.endian {
            Endian::Little => LE::write_uint(&mut buf, value, size as usize),
            Endian::Big => BE::write_uint(&mut buf, value, size as usize),
        }
        Ok(buf)
    }
}

/// Patches the value of the named symbol in the ELF image.
///
/// Returns the range of the patched bytes.
pub fn patch(image: &mut [u8], name: &str, value: u64) -> Result<Range<usize>, Error> {
    let (offset, bytes) = {
        let elf = Elf32::parse(image)?;
        let symbol = elf.find_symbol(name)?;
        let offset = elf.symbol_offset(name, &symbol)?;
        (offset, elf.encode(name, &symbol, value)?)
    };

    let range = offset..offset + bytes.len();
    image[range.clone()].copy_from_slice(&bytes);
    Ok(range)
}
