// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Integration tests for the statically placed test payload
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 7 integration tests (3 Linux-only image scans)
//!
//! TEST_SCENARIOS:
//!   - region_length_matches_type_sizes(): compile-time length equals the real size difference
//!   - accessor_is_stable(): repeated calls return the same address, no copies
//!   - label_round_trips_byte_for_byte(): body equals the build-time literal, terminator included
//!   - raw_pointer_views_the_same_record(): C-ABI export points at the record
//!   - running_executable_carries_the_record(): section scan over our own image
//!   - foreign_identity_is_not_found_in_own_image(): no false positives
//!   - process_search_finds_the_record(): walk of every mapped module

use std::mem::size_of;

use nexus_payload::SectionHeader;
use payload_fixture::{
    get_private_stuff, private_stuff, PrivateStuff, LABEL_CAPACITY, TEST_PAYLOAD_GUID,
    TEST_PAYLOAD_LABEL,
};

#[test]
fn region_length_matches_type_sizes() {
    let record = private_stuff();
    let expected = size_of::<PrivateStuff>() - size_of::<SectionHeader>();
    assert_eq!(record.region_length() as usize, expected);
    assert_eq!(record.header().reserved, 0);
    assert_eq!(record.identity(), TEST_PAYLOAD_GUID);
}

#[test]
fn accessor_is_stable() {
    let first = get_private_stuff();
    let second = get_private_stuff();
    assert!(!first.is_null());
    assert_eq!(first, second);
    assert!(std::ptr::eq(private_stuff(), private_stuff()));
}

#[test]
fn label_round_trips_byte_for_byte() {
    let bytes = private_stuff().body().as_bytes();
    assert_eq!(bytes.len(), LABEL_CAPACITY);
    let text = TEST_PAYLOAD_LABEL.as_bytes();
    assert_eq!(&bytes[..text.len()], text);
    assert_eq!(bytes[text.len()], 0, "terminator inside the buffer");
    assert!(bytes[text.len()..].iter().all(|&b| b == 0));
    assert_eq!(private_stuff().body().as_str(), TEST_PAYLOAD_LABEL);
}

#[test]
fn raw_pointer_views_the_same_record() {
    let ptr = get_private_stuff() as *const PrivateStuff;
    assert!(std::ptr::eq(ptr, private_stuff()));
    // SAFETY: the export returns the address of a `'static` PrivateStuff.
    let record = unsafe { &*ptr };
    assert_eq!(record.body().as_str(), TEST_PAYLOAD_LABEL);
}

#[cfg(target_os = "linux")]
mod image {
    use super::*;
    use nexus_payload::{decode_label, Guid, PayloadError};
    use nexus_payload_image::{find_in_process, Error, OwnedModule, PayloadSource};

    #[test]
    fn running_executable_carries_the_record() {
        // Keep the record referenced from this binary.
        let expected = private_stuff().body().as_bytes();
        let module = OwnedModule::current().expect("read own executable");
        let image = module.image().expect("parse own executable");
        let body = image.find(TEST_PAYLOAD_GUID).expect("record in own image");
        assert_eq!(body, &expected[..]);
        assert_eq!(decode_label(body), Ok(TEST_PAYLOAD_LABEL));
    }

    #[test]
    fn foreign_identity_is_not_found_in_own_image() {
        let _ = private_stuff();
        let module = OwnedModule::current().expect("read own executable");
        let image = module.image().expect("parse own executable");
        let other = Guid::from_fields(0xdead_beef, 0, 0, [0; 8]);
        assert!(matches!(
            image.find(other),
            Err(Error::Payload(PayloadError::RecordNotFound))
        ));
    }

    #[test]
    fn process_search_finds_the_record() {
        let _ = private_stuff();
        let found = find_in_process(TEST_PAYLOAD_GUID)
            .expect("search")
            .expect("record in some loaded module");
        assert_eq!(decode_label(&found.body), Ok(TEST_PAYLOAD_LABEL));
    }
}
