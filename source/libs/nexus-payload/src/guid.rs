// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use core::fmt;
use core::str::FromStr;

use uuid::Uuid;

use crate::error::GuidParseError;
use crate::record::Endian;

/// 128-bit identifier naming a payload *kind*.
///
/// Field layout matches the classic `GUID` struct so a record written by a C
/// toolchain and one declared here are byte-compatible.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid {
    /// First group, stored in the image's byte order.
    pub data1: u32,
    /// Second group, stored in the image's byte order.
    pub data2: u16,
    /// Third group, stored in the image's byte order.
    pub data3: u16,
    /// Trailing eight bytes, stored as-is.
    pub data4: [u8; 8],
}

impl Guid {
    /// Encoded size in bytes.
    pub const SIZE: usize = 16;

    /// The all-zero identity. Never a valid payload kind.
    pub const NIL: Guid = Guid::from_fields(0, 0, 0, [0; 8]);

    /// Builds a GUID from its four groups.
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self { data1, data2, data3, data4 }
    }

    /// Returns true for [`Guid::NIL`].
    pub const fn is_nil(&self) -> bool {
        self.data1 == 0
            && self.data2 == 0
            && self.data3 == 0
            && u64::from_ne_bytes(self.data4) == 0
    }

    /// Converts to a [`Uuid`] with the same textual form.
    pub fn to_uuid(self) -> Uuid {
        Uuid::from_fields(self.data1, self.data2, self.data3, &self.data4)
    }

    /// Converts from a [`Uuid`], keeping the textual form.
    pub fn from_uuid(uuid: Uuid) -> Self {
        let (data1, data2, data3, data4) = uuid.as_fields();
        Self::from_fields(data1, data2, data3, *data4)
    }

    /// Decodes the 16-byte on-image form. `bytes` must hold at least [`Guid::SIZE`] bytes.
    pub(crate) fn decode(bytes: &[u8], endian: Endian) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..16]);
        Self {
            data1: endian.read_u32(&bytes[0..4]),
            data2: endian.read_u16(&bytes[4..6]),
            data3: endian.read_u16(&bytes[6..8]),
            data4,
        }
    }

    /// Encodes into the 16-byte on-image form.
    pub(crate) fn encode(&self, out: &mut [u8], endian: Endian) {
        endian.write_u32(&mut out[0..4], self.data1);
        endian.write_u16(&mut out[4..6], self.data2);
        endian.write_u16(&mut out[6..8], self.data3);
        out[8..16].copy_from_slice(&self.data4);
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_uuid().hyphenated(), f)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}

impl FromStr for Guid {
    type Err = GuidParseError;

    /// Accepts the hyphenated form, optionally wrapped in braces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(s.trim()).map(Self::from_uuid).map_err(|_| GuidParseError)
    }
}
