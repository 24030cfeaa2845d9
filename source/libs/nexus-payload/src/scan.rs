// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded linear walk over a payload section.

use crate::error::{LabelError, PayloadError};
use crate::guid::Guid;
use crate::record::{decode_label, Endian, SectionHeader, HEADER_SIZE};

/// One well-formed record found in a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordView<'a> {
    /// Offset of the header from the start of the section.
    pub offset: usize,
    /// Decoded header.
    pub header: SectionHeader,
    /// The `region_length` bytes following the header.
    pub body: &'a [u8],
}

impl<'a> RecordView<'a> {
    /// Kind of this record.
    pub fn identity(&self) -> Guid {
        self.header.identity
    }

    /// Section bytes covered by this record, header included.
    pub fn span(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }

    /// Decodes the body as a NUL-terminated label.
    pub fn label(&self) -> Result<&'a str, LabelError> {
        decode_label(self.body)
    }
}

/// Iterator over the records of one section.
///
/// Yields at most one error; after it, iteration ends. A tail shorter than a
/// header, or an all-zero header, ends the walk when it is padding.
#[derive(Debug, Clone)]
pub struct PayloadScanner<'a> {
    section: &'a [u8],
    endian: Endian,
    offset: usize,
    done: bool,
}

impl<'a> PayloadScanner<'a> {
    /// Starts a walk at the front of `section`.
    pub fn new(section: &'a [u8], endian: Endian) -> Self {
        Self { section, endian, offset: 0, done: false }
    }

    /// Offset the next header will be read from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn halt(&mut self, err: PayloadError) -> Option<Result<RecordView<'a>, PayloadError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for PayloadScanner<'a> {
    type Item = Result<RecordView<'a>, PayloadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let offset = self.offset;
        let remaining = &self.section[offset..];
        if remaining.is_empty() {
            self.done = true;
            return None;
        }

        let Some(header) = SectionHeader::decode(remaining, self.endian) else {
            if remaining.iter().all(|&b| b == 0) {
                self.done = true;
                return None;
            }
            return self.halt(PayloadError::CorruptRecord {
                offset,
                declared: HEADER_SIZE,
                available: remaining.len(),
            });
        };
        if header.is_padding() {
            self.done = true;
            return None;
        }

        let declared = header.region_length as usize;
        let available = remaining.len() - HEADER_SIZE;
        if declared > available {
            return self.halt(PayloadError::CorruptRecord { offset, declared, available });
        }
        if header.reserved != 0 {
            log::warn!(
                "payload {} at {:#x}: reserved field is {:#x}, expected zero",
                header.identity,
                offset,
                header.reserved
            );
        }
        log::trace!("payload {} at {:#x}, {} bytes", header.identity, offset, declared);

        let body = &remaining[HEADER_SIZE..HEADER_SIZE + declared];
        self.offset = offset + HEADER_SIZE + declared;
        Some(Ok(RecordView { offset, header, body }))
    }
}

fn present(section: Option<&[u8]>) -> Result<&[u8], PayloadError> {
    match section {
        Some(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(PayloadError::SectionAbsent),
    }
}

/// Finds the first record of kind `identity`.
///
/// Records before the match must be well formed; a corrupt header halts the
/// walk even if a match might follow it.
pub fn find_record<'a>(
    section: Option<&'a [u8]>,
    endian: Endian,
    identity: Guid,
) -> Result<RecordView<'a>, PayloadError> {
    let section = present(section)?;
    for record in PayloadScanner::new(section, endian) {
        let record = record?;
        if record.identity() == identity {
            return Ok(record);
        }
    }
    Err(PayloadError::RecordNotFound)
}

/// Body of the first record of kind `identity`.
pub fn find_payload<'a>(
    section: Option<&'a [u8]>,
    endian: Endian,
    identity: Guid,
) -> Result<&'a [u8], PayloadError> {
    find_record(section, endian, identity).map(|record| record.body)
}

/// Like [`find_record`], but walks the whole section and rejects a second
/// record of the same kind.
pub fn find_unique_payload<'a>(
    section: Option<&'a [u8]>,
    endian: Endian,
    identity: Guid,
) -> Result<RecordView<'a>, PayloadError> {
    let section = present(section)?;
    let mut found: Option<RecordView<'a>> = None;
    for record in PayloadScanner::new(section, endian) {
        let record = record?;
        if record.identity() != identity {
            continue;
        }
        if let Some(first) = found {
            return Err(PayloadError::DuplicateIdentity {
                identity,
                first: first.offset,
                second: record.offset,
            });
        }
        found = Some(record);
    }
    found.ok_or(PayloadError::RecordNotFound)
}

/// Total bytes covered by the section's records, headers included.
///
/// Trailing padding is not counted.
pub fn payloads_size(section: &[u8], endian: Endian) -> Result<usize, PayloadError> {
    PayloadScanner::new(section, endian).try_fold(0usize, |total, record| Ok(total + record?.span()))
}
