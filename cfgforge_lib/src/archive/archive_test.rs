//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the archive container codec.

use std::io::Cursor;

use crate::hashing::ContentHash;

use super::*;

fn sample_archive() -> Archive {
    let mut archive = Archive::new(1_700_000_000_000_000);
    archive.insert("Fruits.mpc", b"fruit payload".to_vec());
    archive.insert("Shared.mpa", vec![7; 1024]);
    archive.insert("_metadata", b"{}".to_vec());
    archive
}

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// Full round-trip: entry order, names, hashes, createdAt all survive.
#[test]
fn encode_decode_round_trip() {
    let mut archive = sample_archive();
    let mut data = vec![];
    archive.encode(&mut data, &None).unwrap();

    let decoded = Archive::decode(&mut Cursor::new(&data), &None).unwrap();
    assert_eq!(archive, decoded);
    assert_eq!(decoded.created_at(), &1_700_000_000_000_000);
    assert_eq!(decoded.bytes("Fruits.mpc").unwrap(), b"fruit payload");
}

/// Encoding twice yields byte-identical output.
#[test]
fn encode_is_idempotent() {
    let mut archive = sample_archive();
    let mut first = vec![];
    archive.encode(&mut first, &None).unwrap();

    let mut decoded = Archive::decode(&mut Cursor::new(&first), &None).unwrap();
    let mut second = vec![];
    decoded.encode(&mut second, &None).unwrap();

    assert_eq!(first, second);
}

/// Entries land in ascending byte-wise name order, which puts `_metadata` last.
#[test]
fn entries_are_name_sorted() {
    let archive = sample_archive();
    assert_eq!(archive.entry_names(), vec!["Fruits.mpc", "Shared.mpa", "_metadata"]);
}

/// Every entry hash matches its raw payload; the version derives from the sorted entry list.
#[test]
fn hashes_and_version() {
    let mut archive = sample_archive();
    for entry in archive.entries() {
        assert_eq!(*entry.hash(), ContentHash::of(entry.data()));
    }

    let mut data = vec![];
    archive.encode(&mut data, &None).unwrap();
    let decoded = Archive::decode(&mut Cursor::new(&data), &None).unwrap();
    assert_eq!(decoded.version(), &decoded.compute_version());

    // Changing any payload changes the version.
    let before = *archive.version();
    archive.insert("Fruits.mpc", b"different payload".to_vec());
    assert_ne!(before, *archive.version());
}

/// Large entries get deflated, small ones stay raw, and both decode back.
#[test]
fn compression_threshold() {
    let mut archive = sample_archive();
    let mut data = vec![];
    archive.encode(&mut data, &Some(EncodeableExtraData { min_compress_size: 64 })).unwrap();

    // 1024 compressible bytes shrink the stream below the raw size.
    let raw_total: usize = archive.entries().iter().map(|entry| entry.data().len()).sum();
    assert!(data.len() < raw_total);

    let decoded = Archive::decode(&mut Cursor::new(&data), &None).unwrap();
    assert_eq!(decoded.bytes("Shared.mpa").unwrap(), vec![7; 1024]);
}

/// Replacing an entry by name keeps exactly one copy.
#[test]
fn insert_replaces_by_name() {
    let mut archive = sample_archive();
    archive.insert("Fruits.mpc", b"second".to_vec());
    assert_eq!(archive.entries().len(), 3);
    assert_eq!(archive.bytes("Fruits.mpc").unwrap(), b"second");
}

/// Unknown entries report cleanly.
#[test]
fn missing_entry() {
    let archive = sample_archive();
    assert!(archive.contains("Fruits.mpc"));
    assert!(!archive.contains("Vegetables.mpc"));
    assert!(archive.bytes("Vegetables.mpc").is_err());
}

/// A pre-4 schema version recomputes the archive version from the entry list on read.
#[test]
fn old_schema_version_recomputes() {
    let mut archive = sample_archive();
    archive.schema_version = 3;
    archive.version = ContentHash::from_raw(0xDEAD);

    let mut data = vec![];
    archive.encode(&mut data, &None).unwrap();

    // Corrupt the stored version in the header: bytes 4..20.
    for byte in &mut data[4..20] {
        *byte = 0xFF;
    }

    let decoded = Archive::decode(&mut Cursor::new(&data), &None).unwrap();
    assert_eq!(decoded.version(), &decoded.compute_version());
}

/// Damaged payloads fail the hash check.
#[test]
fn hash_mismatch_is_detected() {
    let mut archive = Archive::new(0);
    archive.insert("A.mpc", b"payload".to_vec());

    let mut data = vec![];
    archive.encode(&mut data, &Some(EncodeableExtraData { min_compress_size: usize::MAX })).unwrap();

    // Flip one payload byte at the very end.
    let last = data.len() - 1;
    data[last] ^= 0xFF;

    assert!(matches!(
        Archive::decode(&mut Cursor::new(&data), &None),
        Err(crate::error::CfgLibError::ArchiveEntryHashMismatch(_)),
    ));
    assert!(Archive::decode(&mut Cursor::new(&data), &Some(DecodeableExtraData { skip_hash_check: true })).is_ok());
}

/// Truncated headers and unknown schema versions are rejected.
#[test]
fn bad_headers() {
    assert!(matches!(
        Archive::decode(&mut Cursor::new(vec![1, 2]), &None),
        Err(crate::error::CfgLibError::ArchiveHeaderNotComplete),
    ));

    let mut archive = Archive::new(0);
    let mut data = vec![];
    archive.encode(&mut data, &None).unwrap();
    data[0] = 99;
    assert!(matches!(
        Archive::decode(&mut Cursor::new(&data), &None),
        Err(crate::error::CfgLibError::UnknownArchiveSchemaVersion(99)),
    ));
}
