// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: GUID-tagged payload records placed in a dedicated module section (no_std)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (record layout is frozen once published)
//! TEST_COVERAGE: Unit tests per module + proptest scanner fuzzing + integration tests
//!
//! PUBLIC API:
//!   - Guid: 128-bit payload kind identifier
//!   - SectionHeader / PayloadRecord / Label: fixed record layout
//!   - declare_payload!: places a record into the payload section
//!   - PayloadScanner / find_payload / find_unique_payload: bounded discovery
//!   - SectionBuilder (feature `alloc`): synthesizes section bytes
//!
//! Notes:
//! - A module carries zero or more records in the section named [`SECTION_NAME`]
//!   (`__DATA,__payload` on Mach-O). Records are packed back to back with no index;
//!   discovery walks `region_length` from header to header.
//! - The scanner never reads past the section slice it was given. A length that
//!   overruns the section halts the walk with [`PayloadError::CorruptRecord`].

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod error;
mod guid;
mod record;
mod scan;

#[cfg(feature = "alloc")]
mod builder;

pub use error::{GuidParseError, LabelError, PayloadError};
pub use guid::Guid;
pub use record::{decode_label, Endian, Label, PayloadRecord, SectionHeader, HEADER_SIZE, RECORD_ALIGN};
pub use scan::{
    find_payload, find_record, find_unique_payload, payloads_size, PayloadScanner, RecordView,
};

#[cfg(feature = "alloc")]
pub use builder::SectionBuilder;

/// Section name holding payload records on ELF and PE images.
///
/// Kept to eight bytes so it fits a PE section table entry without a string table.
pub const SECTION_NAME: &str = ".payload";

/// Mach-O segment holding the payload section.
pub const MACHO_SEGMENT: &str = "__DATA";

/// Mach-O section name holding payload records.
pub const MACHO_SECTION: &str = "__payload";

/// Declares a statically initialized payload record in the payload section.
///
/// The record must be a constant expression; nothing runs at load time. The
/// static is marked `#[used]` so it survives even when nothing references it.
///
/// ```ignore
/// nexus_payload::declare_payload! {
///     static STUFF: PayloadRecord<Label<32>> =
///         PayloadRecord::new(MY_GUID, Label::new("Testing Payload 123"));
/// }
/// ```
#[macro_export]
macro_rules! declare_payload {
    ($(#[$meta:meta])* $vis:vis static $name:ident : $ty:ty = $init:expr;) => {
        $(#[$meta])*
        #[used]
        #[cfg_attr(
            any(target_os = "macos", target_os = "ios"),
            link_section = "__DATA,__payload"
        )]
        #[cfg_attr(
            not(any(target_os = "macos", target_os = "ios")),
            link_section = ".payload"
        )]
        $vis static $name: $ty = $init;
    };
}
