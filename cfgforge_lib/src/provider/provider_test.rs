//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the blob providers. The HTTP provider's race needs a live socket and is covered by
//! the provider contract tests of the deployment, not here.

use crate::archive::Archive;
use crate::error::CfgLibError;

use super::*;

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// The in-memory provider stores and serves blobs by (name, version).
#[tokio::test]
async fn memory_provider_round_trip() {
    let provider = MemoryBlobProvider::new();
    provider.put("SharedConfig", "v1", b"payload").await.unwrap();

    assert_eq!(provider.get("SharedConfig", "v1").await.unwrap(), b"payload");
    assert!(matches!(provider.get("SharedConfig", "v2").await, Err(CfgLibError::BlobNotFound(_))));
}

/// The caching provider reads through and fills the cache; cache hits skip the base.
#[tokio::test]
async fn caching_provider_reads_through() {
    let base = MemoryBlobProvider::new();
    base.put("SharedConfig", "v1", b"payload").await.unwrap();

    let caching = CachingBlobProvider::new(base, MemoryBlobProvider::new());

    assert_eq!(caching.get("SharedConfig", "v1").await.unwrap(), b"payload");

    // Now served by the cache even if the base forgets the blob.
    caching.base.blobs.lock().unwrap().clear();
    assert_eq!(caching.get("SharedConfig", "v1").await.unwrap(), b"payload");
}

/// Writes through the caching provider are rejected.
#[tokio::test]
async fn caching_provider_rejects_writes() {
    let caching = CachingBlobProvider::new(MemoryBlobProvider::new(), MemoryBlobProvider::new());
    assert!(matches!(
        caching.put("SharedConfig", "v1", b"payload").await,
        Err(CfgLibError::BlobWritesUnsupported),
    ));
}

/// The archive provider decodes fetched bytes and enforces the version match.
#[tokio::test]
async fn archive_provider_round_trip() {
    let mut archive = Archive::new(123);
    archive.insert("Fruits.mpc", b"fruit payload".to_vec());

    let provider = ConfigArchiveProvider::new(MemoryBlobProvider::new(), "SharedConfig");
    provider.put_archive(&mut archive).await.unwrap();

    let version = archive.version().to_string();
    let fetched = provider.get_archive(&version).await.unwrap();
    assert_eq!(fetched, archive);

    assert!(matches!(
        provider.get_archive("0123456789abcdef0123456789abcdef").await,
        Err(CfgLibError::BlobNotFound(_)),
    ));
}

/// A blob stored under one version but carrying other content fails the version check.
#[tokio::test]
async fn archive_provider_detects_version_mismatch() {
    let mut archive = Archive::new(123);
    archive.insert("Fruits.mpc", b"fruit payload".to_vec());

    let inner = MemoryBlobProvider::new();
    let mut data = vec![];
    use crate::archive::Encodeable;
    archive.encode(&mut data, &None).unwrap();
    inner.put("SharedConfig", "wrong-version", &data).await.unwrap();

    let provider = ConfigArchiveProvider::new(inner, "SharedConfig");
    assert!(matches!(
        provider.get_archive("wrong-version").await,
        Err(CfgLibError::BlobVersionMismatch(..)),
    ));
}
