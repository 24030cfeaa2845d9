// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Payload discovery over module images (ELF, PE, Mach-O)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests + integration tests over generated object files
//!
//! PUBLIC API:
//!   - ModuleImage::parse(bytes): resolve the payload section of an image
//!   - PayloadSource: lookup helpers shared by every section provider
//!   - OwnedModule::open/current: read a module from disk
//!   - loaded_modules/find_in_process: walk modules mapped into this process (Linux)
//!
//! DEPENDENCIES:
//!   - goblin: container parsing
//!   - nexus-payload: record layout and bounded scanner

#![forbid(unsafe_code)]

use core::fmt;
use core::ops::Range;
use std::path::{Path, PathBuf};

use goblin::elf::section_header::SHT_NOBITS;
use goblin::elf::Elf;
use goblin::mach::{Mach, MachO};
use goblin::pe::PE;
use goblin::Object;
use nexus_payload::{
    find_record, find_unique_payload, payloads_size, Endian, Guid, PayloadError, PayloadScanner,
    RecordView, MACHO_SECTION, MACHO_SEGMENT, SECTION_NAME,
};
use thiserror::Error;

mod process;

pub use process::{find_in_process, is_module_file, loaded_modules, parse_maps, ProcessMatch};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid image: {0}")]
    InvalidImage(&'static str),
    #[error("unsupported image: {0}")]
    Unsupported(&'static str),
    #[error("value out of bounds")]
    Oob,
    #[error("image truncated")]
    Truncated,
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

impl Error {
    /// True when the lookup simply found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Payload(err) if err.is_not_found())
    }
}

/// Container format of a parsed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Elf,
    Pe,
    MachO,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Elf => "elf",
            Self::Pe => "pe",
            Self::MachO => "mach-o",
        })
    }
}

/// Anything that can hand out a payload section and its byte order.
///
/// The provided methods implement the discovery contract on top of those two.
pub trait PayloadSource {
    /// Bytes of the payload section, `None` when the module has none.
    fn payload_section(&self) -> Option<&[u8]>;

    /// Byte order of the section's multi-byte fields.
    fn endian(&self) -> Endian;

    /// Walks every record in the section; empty when the section is absent.
    fn records(&self) -> PayloadScanner<'_> {
        PayloadScanner::new(self.payload_section().unwrap_or_default(), self.endian())
    }

    /// First record of kind `identity`.
    fn find_record(&self, identity: Guid) -> Result<RecordView<'_>, Error> {
        Ok(find_record(self.payload_section(), self.endian(), identity)?)
    }

    /// Body of the first record of kind `identity`.
    fn find(&self, identity: Guid) -> Result<&[u8], Error> {
        self.find_record(identity).map(|record| record.body)
    }

    /// Record of kind `identity`, rejecting duplicates.
    fn find_unique(&self, identity: Guid) -> Result<RecordView<'_>, Error> {
        Ok(find_unique_payload(self.payload_section(), self.endian(), identity)?)
    }

    /// Bytes covered by well-formed records.
    fn payloads_size(&self) -> Result<usize, Error> {
        match self.payload_section() {
            Some(section) => Ok(payloads_size(section, self.endian())?),
            None => Ok(0),
        }
    }
}

/// A parsed module image borrowing its file bytes.
#[derive(Debug, Clone)]
pub struct ModuleImage<'a> {
    bytes: &'a [u8],
    format: ImageFormat,
    endian: Endian,
    section: Option<Range<usize>>,
}

impl<'a> ModuleImage<'a> {
    /// Parses `bytes` and resolves the payload section's file range.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < 4 {
            return Err(Error::Truncated);
        }
        let object = Object::parse(bytes).map_err(|_| Error::InvalidImage("parse error"))?;
        let (format, endian, section) = match object {
            Object::Elf(elf) => (ImageFormat::Elf, elf_endian(&elf), elf_section(&elf, bytes.len())?),
            Object::PE(pe) => (ImageFormat::Pe, Endian::Little, pe_section(&pe, bytes.len())?),
            Object::Mach(Mach::Binary(macho)) => {
                (ImageFormat::MachO, macho_endian(&macho), macho_section(&macho, bytes.len())?)
            }
            Object::Mach(Mach::Fat(_)) => return Err(Error::Unsupported("fat Mach-O")),
            _ => return Err(Error::Unsupported("not an ELF, PE or Mach-O module")),
        };
        match &section {
            Some(range) => log::debug!(
                "{format} image: payload section at {:#x}, {} bytes",
                range.start,
                range.len()
            ),
            None => log::debug!("{format} image: no payload section"),
        }
        Ok(Self { bytes, format, endian, section })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// File offset range of the payload section.
    pub fn section_range(&self) -> Option<Range<usize>> {
        self.section.clone()
    }

    /// Section bytes with the image's lifetime rather than `self`'s.
    pub fn section_bytes(&self) -> Option<&'a [u8]> {
        self.section.clone().map(|range| &self.bytes[range])
    }
}

impl PayloadSource for ModuleImage<'_> {
    fn payload_section(&self) -> Option<&[u8]> {
        self.section_bytes()
    }

    fn endian(&self) -> Endian {
        self.endian
    }
}

/// A module read from disk.
#[derive(Debug, Clone)]
pub struct OwnedModule {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl OwnedModule {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path).map_err(|source| Error::Io { path: path.clone(), source })?;
        Ok(Self { path, bytes })
    }

    /// The executable of the running process.
    pub fn current() -> Result<Self, Error> {
        let path = std::env::current_exe()
            .map_err(|source| Error::Io { path: PathBuf::from("<current exe>"), source })?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn image(&self) -> Result<ModuleImage<'_>, Error> {
        ModuleImage::parse(&self.bytes)
    }
}

fn elf_endian(elf: &Elf<'_>) -> Endian {
    if elf.little_endian {
        Endian::Little
    } else {
        Endian::Big
    }
}

fn macho_endian(macho: &MachO<'_>) -> Endian {
    if macho.little_endian {
        Endian::Little
    } else {
        Endian::Big
    }
}

fn elf_section(elf: &Elf<'_>, len: usize) -> Result<Option<Range<usize>>, Error> {
    for sh in &elf.section_headers {
        if elf.shdr_strtab.get_at(sh.sh_name) != Some(SECTION_NAME) {
            continue;
        }
        if sh.sh_type == SHT_NOBITS {
            return Err(Error::InvalidImage("payload section has no file data"));
        }
        return file_range(len, sh.sh_offset, sh.sh_size).map(Some);
    }
    Ok(None)
}

fn pe_section(pe: &PE<'_>, len: usize) -> Result<Option<Range<usize>>, Error> {
    for section in &pe.sections {
        if section.name().ok() != Some(SECTION_NAME) {
            continue;
        }
        // Raw data is rounded up to the file alignment; the virtual size is exact.
        let size = match section.virtual_size {
            0 => section.size_of_raw_data,
            virtual_size => virtual_size.min(section.size_of_raw_data),
        };
        return file_range(len, section.pointer_to_raw_data.into(), size.into()).map(Some);
    }
    Ok(None)
}

fn macho_section(macho: &MachO<'_>, len: usize) -> Result<Option<Range<usize>>, Error> {
    for segment in macho.segments.iter() {
        let sections = segment.sections().map_err(|_| Error::InvalidImage("bad Mach-O section"))?;
        for (section, _) in sections {
            if section.segname().ok() != Some(MACHO_SEGMENT) || section.name().ok() != Some(MACHO_SECTION) {
                continue;
            }
            return file_range(len, section.offset.into(), section.size).map(Some);
        }
    }
    Ok(None)
}

fn file_range(len: usize, offset: u64, size: u64) -> Result<Range<usize>, Error> {
    let start = usize::try_from(offset).map_err(|_| Error::Oob)?;
    let size = usize::try_from(size).map_err(|_| Error::Oob)?;
    let end = start.checked_add(size).ok_or(Error::Oob)?;
    if end > len {
        return Err(Error::Truncated);
    }
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_range_checks_bounds() {
        assert_eq!(file_range(64, 16, 32).expect("in bounds"), 16..48);
        assert!(matches!(file_range(64, 48, 32), Err(Error::Truncated)));
        assert!(matches!(file_range(64, u64::MAX, 2), Err(Error::Oob | Error::Truncated)));
    }

    #[test]
    fn rejects_tiny_and_unknown_inputs() {
        assert!(matches!(ModuleImage::parse(b"\x7fE"), Err(Error::Truncated)));
        assert!(ModuleImage::parse(&[0x42; 128]).is_err());
    }

    #[test]
    fn not_found_classification() {
        assert!(Error::from(PayloadError::SectionAbsent).is_not_found());
        assert!(!Error::Truncated.is_not_found());
    }
}
