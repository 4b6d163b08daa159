//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the blob providers: how archives reach clients.
//!
//! The core engine never talks to the network itself; it consumes bytes through the
//! [`BlobProvider`] contract. The HTTP provider races a primary URL against an optional
//! secondary one, with the primary getting a head start; the caching provider composes any two
//! providers into a read-through pair; the archive provider adds the decode step and a fixed
//! config name on top.

use async_trait::async_trait;
use ::log::{info, warn};

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use crate::archive::{Archive, Decodeable};
use crate::error::{CfgLibError, Result};

#[cfg(test)] mod provider_test;

/// How long the primary URL runs alone before the secondary joins the race.
pub const DEFAULT_SECONDARY_HEAD_START: Duration = Duration::from_secs(10);

//---------------------------------------------------------------------------//
//                              Traits
//---------------------------------------------------------------------------//

/// A source (and optionally sink) of named, versioned blobs.
#[async_trait]
pub trait BlobProvider: Send + Sync {

    /// This function fetches one blob.
    async fn get(&self, config_name: &str, version: &str) -> Result<Vec<u8>>;

    /// This function stores one blob. Providers that cannot write reject with
    /// [`CfgLibError::BlobWritesUnsupported`], which is also the default.
    async fn put(&self, _config_name: &str, _version: &str, _data: &[u8]) -> Result<()> {
        Err(CfgLibError::BlobWritesUnsupported)
    }
}

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// A provider fetching blobs over HTTP, with an optional secondary URL raced against the
/// primary.
pub struct HttpBlobProvider {
    client: reqwest::Client,
    primary_base_url: String,
    secondary_base_url: Option<String>,
    secondary_head_start: Duration,
}

/// A read-through composition: reads try the cache first, misses go to the base and are written
/// back to the cache on a best-effort basis. Writes are rejected.
pub struct CachingBlobProvider<Base, Cache> {
    base: Base,
    cache: Cache,
}

/// An in-memory provider. Used as a cache backend and by tests.
#[derive(Default)]
pub struct MemoryBlobProvider {
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
}

/// The thin wrapper game code uses: one fixed config name, plus the archive decode step.
pub struct ConfigArchiveProvider<Inner> {
    inner: Inner,
    config_name: String,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl HttpBlobProvider {

    /// This function creates a provider over one primary URL.
    pub fn new(primary_base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            primary_base_url: primary_base_url.trim_end_matches('/').to_owned(),
            secondary_base_url: None,
            secondary_head_start: DEFAULT_SECONDARY_HEAD_START,
        }
    }

    /// This function adds a secondary URL, raced against the primary after the head start.
    pub fn with_secondary(mut self, secondary_base_url: &str, head_start: Option<Duration>) -> Self {
        self.secondary_base_url = Some(secondary_base_url.trim_end_matches('/').to_owned());
        if let Some(head_start) = head_start {
            self.secondary_head_start = head_start;
        }
        self
    }

    fn blob_url(base: &str, config_name: &str, version: &str) -> String {
        format!("{base}/{config_name}/{version}")
    }

    /// One plain fetch: 2xx with a non-empty body wins, anything else is a failure.
    async fn fetch(&self, url: &str, config_name: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await
            .map_err(|error| CfgLibError::BlobTransportError(config_name.to_owned(), error.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CfgLibError::BlobNotFound(config_name.to_owned()));
        }
        if !response.status().is_success() {
            return Err(CfgLibError::BlobTransportError(config_name.to_owned(), format!("status {} from {url}", response.status())));
        }

        let data = response.bytes().await
            .map_err(|error| CfgLibError::BlobTransportError(config_name.to_owned(), error.to_string()))?;
        if data.is_empty() {
            return Err(CfgLibError::BlobEmptyPayload(config_name.to_owned()));
        }
        Ok(data.to_vec())
    }
}

#[async_trait]
impl BlobProvider for HttpBlobProvider {

    /// Primary races secondary. The primary starts immediately, the secondary joins after its
    /// head start; the first success wins and the loser is dropped mid-flight. When both fail,
    /// the primary's error is the one surfaced.
    async fn get(&self, config_name: &str, version: &str) -> Result<Vec<u8>> {
        let primary_url = Self::blob_url(&self.primary_base_url, config_name, version);

        let secondary_base = match &self.secondary_base_url {
            Some(secondary_base) => secondary_base,
            None => return self.fetch(&primary_url, config_name).await,
        };
        let secondary_url = Self::blob_url(secondary_base, config_name, version);

        let primary_task = self.fetch(&primary_url, config_name);
        let secondary_task = async {
            tokio::time::sleep(self.secondary_head_start).await;
            self.fetch(&secondary_url, config_name).await
        };
        tokio::pin!(primary_task);
        tokio::pin!(secondary_task);

        let mut primary_error: Option<CfgLibError> = None;
        let mut secondary_error: Option<CfgLibError> = None;

        loop {
            tokio::select! {
                result = &mut primary_task, if primary_error.is_none() => match result {
                    Ok(data) => return Ok(data),
                    Err(error) => {
                        if secondary_error.is_some() {
                            warn!("Both blob fetches failed: primary {primary_url}, secondary {secondary_url}.");
                            return Err(error);
                        }
                        primary_error = Some(error);
                    },
                },
                result = &mut secondary_task, if secondary_error.is_none() => match result {
                    Ok(data) => {
                        info!("Secondary blob URL won the race for \"{config_name}\".");
                        return Ok(data);
                    },
                    Err(error) => {
                        if let Some(primary_error) = primary_error.take() {
                            warn!("Both blob fetches failed: primary {primary_url}, secondary {secondary_url}.");
                            return Err(primary_error);
                        }
                        secondary_error = Some(error);
                    },
                },
            }
        }
    }
}

impl<Base: BlobProvider, Cache: BlobProvider> CachingBlobProvider<Base, Cache> {

    /// This function composes a base provider with a cache provider.
    pub fn new(base: Base, cache: Cache) -> Self {
        Self { base, cache }
    }
}

#[async_trait]
impl<Base: BlobProvider, Cache: BlobProvider> BlobProvider for CachingBlobProvider<Base, Cache> {

    async fn get(&self, config_name: &str, version: &str) -> Result<Vec<u8>> {
        if let Ok(data) = self.cache.get(config_name, version).await {
            return Ok(data);
        }

        let data = self.base.get(config_name, version).await?;

        // Cache write problems never fail the read.
        if let Err(error) = self.cache.put(config_name, version, &data).await {
            warn!("Failed to write \"{config_name}\" to the cache: {error}.");
        }

        Ok(data)
    }
}

impl MemoryBlobProvider {

    /// This function creates an empty in-memory provider.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobProvider for MemoryBlobProvider {

    async fn get(&self, config_name: &str, version: &str) -> Result<Vec<u8>> {
        self.blobs.lock().unwrap()
            .get(&(config_name.to_owned(), version.to_owned()))
            .cloned()
            .ok_or_else(|| CfgLibError::BlobNotFound(config_name.to_owned()))
    }

    async fn put(&self, config_name: &str, version: &str, data: &[u8]) -> Result<()> {
        self.blobs.lock().unwrap().insert((config_name.to_owned(), version.to_owned()), data.to_vec());
        Ok(())
    }
}

impl<Inner: BlobProvider> ConfigArchiveProvider<Inner> {

    /// This function wraps a blob provider for one fixed config name.
    pub fn new(inner: Inner, config_name: &str) -> Self {
        Self { inner, config_name: config_name.to_owned() }
    }

    /// This function fetches and decodes one archive, checking the fetched version matches the
    /// requested one.
    pub async fn get_archive(&self, version: &str) -> Result<Archive> {
        let data = self.inner.get(&self.config_name, version).await?;
        let archive = Archive::decode(&mut Cursor::new(data), &None)?;

        let fetched_version = archive.version().to_string();
        if !version.is_empty() && fetched_version != version {
            return Err(CfgLibError::BlobVersionMismatch(self.config_name.clone(), fetched_version, version.to_owned()));
        }
        Ok(archive)
    }

    /// This function encodes and stores one archive, when the inner provider supports writes.
    pub async fn put_archive(&self, archive: &mut Archive) -> Result<()> {
        let mut data = vec![];
        use crate::archive::Encodeable;
        archive.encode(&mut data, &None)?;
        let version = archive.version().to_string();
        self.inner.put(&self.config_name, &version, &data).await
    }
}
