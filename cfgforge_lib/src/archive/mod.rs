//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Archives are the container-type file of the engine: the single binary artifact delivered to
//! clients and servers, holding every config entry as a named, individually compressed blob.
//!
//! # Archive Structure
//!
//! All values LittleEndian.
//!
//! | Bytes | Type           | Data                                                        |
//! | ----- | -------------- | ----------------------------------------------------------- |
//! | 4     | [u32]          | Schema version of the container format.                     |
//! | 16    | hash128        | Archive version: hash over the sorted (name, hash) pairs.   |
//! | 8     | [i64]          | Creation time, in microseconds since the unix epoch.        |
//! | 4     | [u32]          | Amount of entries.                                          |
//!
//! ## Entry
//!
//! | Bytes | Type           | Data                                                        |
//! | ----- | -------------- | ----------------------------------------------------------- |
//! | *     | Sized StringU8 | Entry name.                                                 |
//! | 16    | hash128        | Content hash of the RAW (uncompressed) payload.             |
//! | 1     | [u8]           | Compression: 0 none, 1 deflate.                             |
//! | 4     | [u32]          | Stored payload length, in bytes.                            |
//! | *     | bytes          | Payload.                                                    |
//!
//! Entries are written in ascending name order with a plain byte-wise comparator; readers keep
//! whatever order the file has. Archives with a schema version older than 4 did not store a
//! trustworthy version hash, so the reader recomputes it from the entry list.

use getset::Getters;
use itertools::Itertools;

use std::io::Cursor;

use crate::binary::{ReadBytes, WriteBytes};
use crate::compression::{Compressible, Decompressible};
use crate::error::{CfgLibError, Result};
use crate::hashing::ContentHash;

#[cfg(test)] mod archive_test;

/// Extension used by archives.
pub const EXTENSION: &str = ".mpa";

/// Current schema version of the container format.
pub const SCHEMA_VERSION: u32 = 4;

/// First schema version whose stored archive version is trusted on read.
const FIRST_TRUSTED_VERSION_SCHEMA: u32 = 4;

/// Entries smaller than this stay uncompressed by default.
pub const DEFAULT_MIN_COMPRESS_SIZE: usize = 64;

/// Compression byte: payload stored raw.
const COMPRESSION_NONE: u8 = 0;

/// Compression byte: payload stored as a raw deflate stream.
const COMPRESSION_DEFLATE: u8 = 1;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// One named blob within an archive.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ArchiveEntry {

    /// Name of the entry.
    name: String,

    /// Content hash of the raw payload.
    hash: ContentHash,

    /// The raw (decompressed) payload.
    data: Vec<u8>,
}

/// An archive: versioned, entry-addressed container of config blobs.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Archive {

    /// Schema version of the container format this archive was read with or will be written as.
    schema_version: u32,

    /// Version hash over the sorted entry list.
    version: ContentHash,

    /// Creation time, microseconds since the unix epoch.
    created_at: i64,

    /// The entries. Kept in ascending name order for built archives; decoded archives keep
    /// their file order.
    entries: Vec<ArchiveEntry>,
}

/// Extra parameters for decoding an archive.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeableExtraData {

    /// Skip the per-entry content hash check. Only for tooling that knowingly reads damaged files.
    pub skip_hash_check: bool,
}

/// Extra parameters for encoding an archive.
#[derive(Clone, Copy, Debug)]
pub struct EncodeableExtraData {

    /// Entries at least this big get deflated.
    pub min_compress_size: usize,
}

/// This trait marks a type decodeable from a binary source.
pub trait Decodeable: Sized {

    /// This method provides a generic and expandable way to decode anything implementing
    /// [`ReadBytes`] into the implementor's structure.
    fn decode<R: ReadBytes>(data: &mut R, extra_data: &Option<DecodeableExtraData>) -> Result<Self>;
}

/// This trait marks a type encodeable to a binary destination.
pub trait Encodeable {

    /// This method provides a generic and expandable way to encode any implementor's structure
    /// into anything implementing [`WriteBytes`].
    fn encode<W: WriteBytes>(&mut self, buffer: &mut W, extra_data: &Option<EncodeableExtraData>) -> Result<()>;
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl Default for EncodeableExtraData {
    fn default() -> Self {
        Self { min_compress_size: DEFAULT_MIN_COMPRESS_SIZE }
    }
}

impl ArchiveEntry {

    /// This function builds an entry from its raw payload, hashing it.
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        Self { name: name.to_owned(), hash: ContentHash::of(&data), data }
    }
}

impl Archive {

    /// This function creates a new empty archive with the provided creation time.
    pub fn new(created_at: i64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: ContentHash::default(),
            created_at,
            entries: vec![],
        }
    }

    /// This function inserts an entry, keeping entries sorted by name. An entry with the same
    /// name is replaced.
    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        let entry = ArchiveEntry::new(name, data);
        match self.entries.binary_search_by(|candidate| candidate.name().as_str().cmp(name)) {
            Ok(position) => self.entries[position] = entry,
            Err(position) => self.entries.insert(position, entry),
        }
        self.version = self.compute_version();
    }

    /// This function returns true if an entry with the provided name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name() == name)
    }

    /// This function returns a view over the raw payload of the provided entry.
    pub fn bytes(&self, name: &str) -> Result<&[u8]> {
        self.entries.iter()
            .find(|entry| entry.name() == name)
            .map(|entry| entry.data().as_slice())
            .ok_or_else(|| CfgLibError::ArchiveEntryNotFound(name.to_owned()))
    }

    /// This function returns a readable stream over the raw payload of the provided entry.
    pub fn reader(&self, name: &str) -> Result<Cursor<&[u8]>> {
        self.bytes(name).map(Cursor::new)
    }

    /// This function returns the names of all entries, in stored order.
    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name().as_str()).collect()
    }

    /// This function derives the archive version from the entry list, sorted by name.
    pub fn compute_version(&self) -> ContentHash {
        let pairs = self.entries.iter()
            .map(|entry| (entry.name().as_str(), *entry.hash()))
            .sorted_by(|a, b| a.0.cmp(b.0));
        ContentHash::of_entry_list(pairs)
    }
}

impl Decodeable for Archive {

    fn decode<R: ReadBytes>(data: &mut R, extra_data: &Option<DecodeableExtraData>) -> Result<Self> {
        let extra_data = extra_data.unwrap_or_default();

        let schema_version = data.read_u32().map_err(|_| CfgLibError::ArchiveHeaderNotComplete)?;
        if schema_version == 0 || schema_version > SCHEMA_VERSION {
            return Err(CfgLibError::UnknownArchiveSchemaVersion(schema_version));
        }

        let stored_version = ContentHash::decode(data).map_err(|_| CfgLibError::ArchiveHeaderNotComplete)?;
        let created_at = data.read_i64().map_err(|_| CfgLibError::ArchiveHeaderNotComplete)?;
        let num_entries = data.read_u32().map_err(|_| CfgLibError::ArchiveHeaderNotComplete)?;

        let mut entries = Vec::with_capacity(num_entries as usize);
        for _ in 0..num_entries {
            let name = data.read_sized_string_u8()?;
            let hash = ContentHash::decode(data)?;
            let compression = data.read_u8()?;
            let length = data.read_u32()?;
            let payload = data.read_slice(length as usize, false)?;

            let raw = match compression {
                COMPRESSION_NONE => payload,
                COMPRESSION_DEFLATE => payload.as_slice().decompress()?,
                _ => return Err(CfgLibError::UnknownCompressionFormat(compression)),
            };

            if !extra_data.skip_hash_check && ContentHash::of(&raw) != hash {
                return Err(CfgLibError::ArchiveEntryHashMismatch(name));
            }

            entries.push(ArchiveEntry { name, hash, data: raw });
        }

        let mut archive = Self { schema_version, version: stored_version, created_at, entries };

        // Old containers did not store a trustworthy version; recover it from the entries.
        if schema_version < FIRST_TRUSTED_VERSION_SCHEMA {
            archive.version = archive.compute_version();
        }

        Ok(archive)
    }
}

impl Encodeable for Archive {

    fn encode<W: WriteBytes>(&mut self, buffer: &mut W, extra_data: &Option<EncodeableExtraData>) -> Result<()> {
        let extra_data = extra_data.unwrap_or_default();

        self.version = self.compute_version();

        buffer.write_u32(self.schema_version)?;
        self.version.encode(buffer)?;
        buffer.write_i64(self.created_at)?;
        buffer.write_u32(self.entries.len() as u32)?;

        for entry in &self.entries {
            buffer.write_sized_string_u8(entry.name())?;
            entry.hash().encode(buffer)?;

            let compress = entry.data().len() >= extra_data.min_compress_size;
            if compress {
                let compressed = entry.data().compress()?;
                buffer.write_u8(COMPRESSION_DEFLATE)?;
                buffer.write_u32(compressed.len() as u32)?;
                buffer.write_all(&compressed)?;
            } else {
                buffer.write_u8(COMPRESSION_NONE)?;
                buffer.write_u32(entry.data().len() as u32)?;
                buffer.write_all(entry.data())?;
            }
        }

        Ok(())
    }
}
