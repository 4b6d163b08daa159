//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains [`ContentHash`], the 128-bit content hash used to identify entry payloads
//! and whole archives.
//!
//! The hash algorithm is xxHash3-128 and is part of the wire format: identical bytes must yield
//! identical hashes across implementations and versions, as clients compare these hashes to decide
//! whether a cached archive is still current.

use serde_derive::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_128;

use std::fmt;
use std::fmt::Display;

use crate::binary::{ReadBytes, WriteBytes};
use crate::error::Result;

#[cfg(test)] mod hashing_test;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// 128-bit content hash of a byte payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(u128);

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl ContentHash {

    /// This function hashes the provided bytes.
    pub fn of(data: &[u8]) -> Self {
        Self(xxh3_128(data))
    }

    /// This function builds a `ContentHash` from its raw value.
    pub fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// This function returns the raw value of the hash.
    pub fn raw(&self) -> u128 {
        self.0
    }

    /// This function derives the version hash of an archive from its entry list.
    ///
    /// The pairs must already be sorted by name with the same stable comparator used to order the
    /// entries themselves; this function hashes them as given.
    pub fn of_entry_list<'a, I: Iterator<Item = (&'a str, ContentHash)>>(entries: I) -> Self {
        let mut data = vec![];
        for (name, hash) in entries {
            data.extend_from_slice(name.as_bytes());
            data.extend_from_slice(&hash.0.to_le_bytes());
        }
        Self::of(&data)
    }

    /// This function reads a `ContentHash` from the provided source.
    pub fn decode<R: ReadBytes>(data: &mut R) -> Result<Self> {
        Ok(Self(data.read_u128()?))
    }

    /// This function writes the `ContentHash` to the provided destination.
    pub fn encode<W: WriteBytes>(&self, buffer: &mut W) -> Result<()> {
        buffer.write_u128(self.0)
    }
}

/// Display as zero-padded lowercase hex, the same form the dashboard shows.
impl Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}
