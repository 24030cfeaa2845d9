// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use alloc::vec::Vec;

use crate::guid::Guid;
use crate::record::{Endian, SectionHeader, HEADER_SIZE, RECORD_ALIGN};

/// Assembles payload section bytes the way a linker lays out declared records.
///
/// Each body is zero-padded to [`RECORD_ALIGN`] and the padding is counted in
/// `region_length`, matching what `PayloadRecord::REGION_LENGTH` stores.
#[derive(Debug, Clone)]
pub struct SectionBuilder {
    endian: Endian,
    bytes: Vec<u8>,
}

impl SectionBuilder {
    /// Starts an empty section in the given byte order.
    pub fn new(endian: Endian) -> Self {
        Self { endian, bytes: Vec::new() }
    }

    /// Appends a well-formed record.
    ///
    /// # Panics
    /// If the padded body does not fit a `u32` length.
    pub fn record(mut self, identity: Guid, body: &[u8]) -> Self {
        let padded = body.len().next_multiple_of(RECORD_ALIGN);
        let region_length = u32::try_from(padded).expect("payload body exceeds u32 length");
        self = self.header(SectionHeader { region_length, reserved: 0, identity });
        self.bytes.extend_from_slice(body);
        self.bytes.resize(self.bytes.len() + padded - body.len(), 0);
        self
    }

    /// Appends a bare header with no body, whatever it declares.
    pub fn header(mut self, header: SectionHeader) -> Self {
        let start = self.bytes.len();
        self.bytes.resize(start + HEADER_SIZE, 0);
        header.encode(&mut self.bytes[start..], self.endian);
        self
    }

    /// Appends `len` zero bytes.
    pub fn padding(mut self, len: usize) -> Self {
        self.bytes.resize(self.bytes.len() + len, 0);
        self
    }

    /// Returns the assembled section.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
