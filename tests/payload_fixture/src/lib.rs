// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Test module carrying one payload record in its payload section
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (TEST_PAYLOAD_GUID is published)
//! TEST_COVERAGE: Integration tests in tests/fixture.rs
//!
//! PUBLIC API:
//!   - TEST_PAYLOAD_GUID / TEST_PAYLOAD_LABEL: what scanners should find
//!   - private_stuff(): borrowed view of this module's record
//!   - get_private_stuff(): C-ABI export returning the record's address

#![deny(clippy::all, missing_docs)]

use core::ffi::c_void;

use nexus_payload::{declare_payload, Guid, Label, PayloadRecord};

/// Kind identifier of the test payload.
pub const TEST_PAYLOAD_GUID: Guid = Guid::from_fields(
    0x7b3e_1f6a,
    0x2c4d,
    0x4e8f,
    [0x9a, 0x1b, 0x5c, 0x6d, 0x7e, 0x8f, 0x9a, 0x0b],
);

/// Label baked into the test payload.
pub const TEST_PAYLOAD_LABEL: &str = "Testing Payload 123";

/// Capacity of the label buffer, terminator included.
pub const LABEL_CAPACITY: usize = 32;

/// Concrete record type of the test payload.
pub type PrivateStuff = PayloadRecord<Label<LABEL_CAPACITY>>;

declare_payload! {
    static PRIVATE_STUFF: PrivateStuff =
        PayloadRecord::new(TEST_PAYLOAD_GUID, Label::new(TEST_PAYLOAD_LABEL));
}

/// This module's payload record.
pub fn private_stuff() -> &'static PrivateStuff {
    &PRIVATE_STUFF
}

/// Address of this module's payload record, for C callers in the same process.
#[no_mangle]
pub extern "C" fn get_private_stuff() -> *const c_void {
    private_stuff() as *const PrivateStuff as *const c_void
}
