//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the content hash.

use std::io::Cursor;

use super::ContentHash;

/// Identical bytes always yield identical hashes; different bytes should not.
#[test]
fn hash_is_deterministic() {
    let a = ContentHash::of(b"payload");
    let b = ContentHash::of(b"payload");
    let c = ContentHash::of(b"other payload");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

/// The version hash depends on both names and entry hashes.
#[test]
fn entry_list_hash() {
    let h1 = ContentHash::of(b"one");
    let h2 = ContentHash::of(b"two");

    let a = ContentHash::of_entry_list([("A.mpc", h1), ("B.mpc", h2)].into_iter());
    let b = ContentHash::of_entry_list([("A.mpc", h1), ("B.mpc", h2)].into_iter());
    let c = ContentHash::of_entry_list([("A.mpc", h2), ("B.mpc", h1)].into_iter());
    let d = ContentHash::of_entry_list([("A.mpc", h1), ("C.mpc", h2)].into_iter());

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
}

/// Encode/decode round-trip through the binary traits.
#[test]
fn encode_decode_round_trip() {
    let hash = ContentHash::of(b"payload");

    let mut data = vec![];
    hash.encode(&mut data).unwrap();
    assert_eq!(data.len(), 16);

    let decoded = ContentHash::decode(&mut Cursor::new(data)).unwrap();
    assert_eq!(hash, decoded);
}

/// Display renders 32 hex chars.
#[test]
fn display_is_padded_hex() {
    let rendered = ContentHash::from_raw(0xAB).to_string();
    assert_eq!(rendered.len(), 32);
    assert!(rendered.ends_with("ab"));
    assert!(rendered.starts_with("0"));
}
