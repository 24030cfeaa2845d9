// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed record layout: a 24-byte header followed by a kind-specific body.

use core::fmt;
use core::mem::size_of;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::LabelError;
use crate::guid::Guid;

/// Encoded size of [`SectionHeader`].
pub const HEADER_SIZE: usize = size_of::<SectionHeader>();

/// Alignment of every [`PayloadRecord`]; record sizes are multiples of it.
pub const RECORD_ALIGN: usize = 8;

const _: () = assert!(HEADER_SIZE == 24);
const _: () = assert!(HEADER_SIZE % RECORD_ALIGN == 0);

/// Byte order of the image a section was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl Endian {
    /// Byte order of the running target.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    pub(crate) fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Self::Little => LittleEndian::read_u32(buf),
            Self::Big => BigEndian::read_u32(buf),
        }
    }

    pub(crate) fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Self::Little => LittleEndian::read_u16(buf),
            Self::Big => BigEndian::read_u16(buf),
        }
    }

    pub(crate) fn write_u32(self, buf: &mut [u8], value: u32) {
        match self {
            Self::Little => LittleEndian::write_u32(buf, value),
            Self::Big => BigEndian::write_u32(buf, value),
        }
    }

    pub(crate) fn write_u16(self, buf: &mut [u8], value: u16) {
        match self {
            Self::Little => LittleEndian::write_u16(buf, value),
            Self::Big => BigEndian::write_u16(buf, value),
        }
    }
}

/// Common prologue of every payload record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Bytes of record content following this header.
    pub region_length: u32,
    /// Must be zero.
    pub reserved: u32,
    /// Kind of payload this record carries.
    pub identity: Guid,
}

impl SectionHeader {
    /// Decodes a header from the front of `bytes`; `None` if fewer than [`HEADER_SIZE`] bytes.
    pub fn decode(bytes: &[u8], endian: Endian) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            region_length: endian.read_u32(&bytes[0..4]),
            reserved: endian.read_u32(&bytes[4..8]),
            identity: Guid::decode(&bytes[8..HEADER_SIZE], endian),
        })
    }

    /// Encodes into the first [`HEADER_SIZE`] bytes of `out`.
    ///
    /// # Panics
    /// If `out` is shorter than [`HEADER_SIZE`].
    pub fn encode(&self, out: &mut [u8], endian: Endian) {
        endian.write_u32(&mut out[0..4], self.region_length);
        endian.write_u32(&mut out[4..8], self.reserved);
        self.identity.encode(&mut out[8..HEADER_SIZE], endian);
    }

    /// An all-zero header is alignment fill, not a record.
    pub fn is_padding(&self) -> bool {
        self.region_length == 0 && self.reserved == 0 && self.identity.is_nil()
    }
}

/// A header plus a body of type `B`, laid out for static placement.
///
/// Build it with [`PayloadRecord::new`] in a `const`/`static` initializer and
/// place it with [`declare_payload!`](crate::declare_payload).
#[repr(C, align(8))]
pub struct PayloadRecord<B> {
    header: SectionHeader,
    body: B,
}

impl<B> PayloadRecord<B> {
    /// Value stored in `region_length`, derived from the type's size.
    pub const REGION_LENGTH: u32 = {
        let len = size_of::<Self>() - size_of::<SectionHeader>();
        assert!(len <= u32::MAX as usize, "payload body too large for region_length");
        len as u32
    };

    /// Creates a record; evaluated at compile time when used in a static.
    pub const fn new(identity: Guid, body: B) -> Self {
        Self {
            header: SectionHeader { region_length: Self::REGION_LENGTH, reserved: 0, identity },
            body,
        }
    }

    /// The record's header.
    pub const fn header(&self) -> &SectionHeader {
        &self.header
    }

    /// The kind identifier.
    pub const fn identity(&self) -> Guid {
        self.header.identity
    }

    /// Declared length of the content after the header.
    pub const fn region_length(&self) -> u32 {
        self.header.region_length
    }

    /// The kind-specific body.
    pub const fn body(&self) -> &B {
        &self.body
    }
}

impl<B: fmt::Debug> fmt::Debug for PayloadRecord<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadRecord")
            .field("header", &self.header)
            .field("body", &self.body)
            .finish()
    }
}

/// Fixed-capacity, NUL-terminated text body.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Label<const N: usize>([u8; N]);

impl<const N: usize> Label<N> {
    /// Copies `text` into the buffer and zero-fills the rest.
    ///
    /// Fails const evaluation if `text` plus its terminator does not fit or if
    /// `text` contains a NUL byte.
    pub const fn new(text: &str) -> Self {
        let src = text.as_bytes();
        assert!(src.len() < N, "label does not fit with its terminator");
        let mut buf = [0u8; N];
        let mut i = 0;
        while i < src.len() {
            assert!(src[i] != 0, "label contains an interior NUL");
            buf[i] = src[i];
            i += 1;
        }
        Self(buf)
    }

    /// Buffer size in bytes, terminator included.
    pub const fn capacity() -> usize {
        N
    }

    /// The whole buffer, trailing zeros included.
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Text up to the terminator.
    pub fn as_str(&self) -> &str {
        decode_label(&self.0).unwrap_or_default()
    }
}

impl<const N: usize> fmt::Debug for Label<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label<{N}>({:?})", self.as_str())
    }
}

/// Reads the text of a label body: UTF-8 up to the first NUL.
pub fn decode_label(body: &[u8]) -> Result<&str, LabelError> {
    let end = body
        .iter()
        .position(|&b| b == 0)
        .ok_or(LabelError::Unterminated { capacity: body.len() })?;
    core::str::from_utf8(&body[..end]).map_err(|_| LabelError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIND: Guid = Guid::from_fields(1, 2, 3, [4, 5, 6, 7, 8, 9, 10, 11]);

    #[repr(C)]
    struct Wide {
        counter: u64,
        tag: u8,
    }

    #[test]
    fn region_length_tracks_body_type() {
        assert_eq!(
            PayloadRecord::<Label<32>>::REGION_LENGTH as usize,
            size_of::<PayloadRecord<Label<32>>>() - HEADER_SIZE
        );
        // Tail padding up to the record alignment is part of the region.
        assert_eq!(PayloadRecord::<Label<20>>::REGION_LENGTH, 24);
        assert_eq!(PayloadRecord::<Wide>::REGION_LENGTH, 16);
        assert_eq!(PayloadRecord::<()>::REGION_LENGTH, 0);
    }

    #[test]
    fn record_sizes_are_aligned() {
        assert_eq!(size_of::<PayloadRecord<Label<21>>>() % RECORD_ALIGN, 0);
        assert_eq!(size_of::<PayloadRecord<Wide>>() % RECORD_ALIGN, 0);
    }

    #[test]
    fn new_fills_header() {
        static RECORD: PayloadRecord<Label<24>> = PayloadRecord::new(KIND, Label::new("hello"));
        assert_eq!(RECORD.identity(), KIND);
        assert_eq!(RECORD.header().reserved, 0);
        assert_eq!(RECORD.region_length(), PayloadRecord::<Label<24>>::REGION_LENGTH);
        assert_eq!(RECORD.body().as_str(), "hello");
    }

    #[test]
    fn label_zero_fills_tail() {
        let label = Label::<8>::new("abc");
        assert_eq!(label.as_bytes(), b"abc\0\0\0\0\0");
        assert_eq!(Label::<8>::capacity(), 8);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn label_rejects_text_without_room_for_terminator() {
        let _ = Label::<4>::new("abcd");
    }

    #[test]
    fn decode_label_errors() {
        assert_eq!(decode_label(b"ok\0junk"), Ok("ok"));
        assert_eq!(decode_label(b"full"), Err(LabelError::Unterminated { capacity: 4 }));
        assert_eq!(decode_label(&[0xff, 0xfe, 0]), Err(LabelError::Utf8));
    }

    #[test]
    fn header_encoding_is_byte_order_aware() {
        let header = SectionHeader { region_length: 0x20, reserved: 0, identity: KIND };
        let mut buf = [0u8; HEADER_SIZE];
        header.encode(&mut buf, Endian::Big);
        assert_eq!(&buf[..4], &[0, 0, 0, 0x20]);
        assert_eq!(SectionHeader::decode(&buf, Endian::Big), Some(header));
        assert_eq!(SectionHeader::decode(&buf[..HEADER_SIZE - 1], Endian::Big), None);
    }

    #[test]
    fn zero_header_is_padding() {
        let decoded = SectionHeader::decode(&[0u8; HEADER_SIZE], Endian::Little).expect("decode");
        assert!(decoded.is_padding());
    }
}
