// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::guid::Guid;

/// Outcome of a payload lookup that did not produce a record.
///
/// [`PayloadError::SectionAbsent`] and [`PayloadError::RecordNotFound`] are ordinary
/// negative results; see [`PayloadError::is_not_found`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The module has no payload section, or the section is empty.
    #[error("payload section absent")]
    SectionAbsent,
    /// The section exists but holds no record with the requested identity.
    #[error("no payload record with the requested identity")]
    RecordNotFound,
    /// A header declares more bytes than remain in the section.
    #[error("corrupt payload record at offset {offset:#x}: declares {declared} bytes, {available} available")]
    CorruptRecord {
        /// Section offset of the offending header.
        offset: usize,
        /// Byte count the header asked for.
        declared: usize,
        /// Bytes actually left in the section.
        available: usize,
    },
    /// Strict lookup saw the same identity twice.
    #[error("payload identity {identity} declared twice (offsets {first:#x} and {second:#x})")]
    DuplicateIdentity {
        /// The repeated identity.
        identity: Guid,
        /// Offset of the first record.
        first: usize,
        /// Offset of the second record.
        second: usize,
    },
}

impl PayloadError {
    /// True for the expected "nothing here" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SectionAbsent | Self::RecordNotFound)
    }

    /// True when the section layout itself is inconsistent.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. })
    }
}

/// Failure decoding a label body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// No NUL terminator inside the buffer.
    #[error("label is not NUL-terminated within {capacity} bytes")]
    Unterminated {
        /// Size of the buffer that was searched.
        capacity: usize,
    },
    /// Bytes before the terminator are not UTF-8.
    #[error("label is not valid UTF-8")]
    Utf8,
}

/// GUID text did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid GUID text")]
pub struct GuidParseError;
