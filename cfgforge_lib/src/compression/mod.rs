//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the code to compress/decompress archive entry payloads.
//!
//! Entries are compressed as raw deflate streams, without zlib or gzip wrappers. The archive
//! keeps its own uncompressed-length and content-hash fields, so no extra header is needed here.
//!
//! The traits [`Compressible`] and [`Decompressible`] within this module contain functions to
//! compress/decompress entry payloads. Implementations of these two traits for &[[`u8`]] are
//! provided within this module.

use flate2::Compression;
use flate2::read::{DeflateDecoder, DeflateEncoder};

use std::io::Read;

use crate::error::{CfgLibError, Result};


//---------------------------------------------------------------------------//
//                                  Traits
//---------------------------------------------------------------------------//

/// Internal trait to implement compression over a data type.
pub trait Compressible {

    /// This function compress the data of an entry, returning the compressed data.
    fn compress(&self) -> Result<Vec<u8>>;
}

/// Internal trait to implement decompression over a data type.
pub trait Decompressible {

    /// This function decompress the provided data, returning the decompressed data, or an error if the decompression failed.
    fn decompress(&self) -> Result<Vec<u8>>;
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl Compressible for [u8] {
    fn compress(&self) -> Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(self, Compression::default());
        let mut compressed_data = Vec::with_capacity(self.len() / 2);
        encoder.read_to_end(&mut compressed_data)?;
        Ok(compressed_data)
    }
}

impl Decompressible for &[u8] {
    fn decompress(&self) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Ok(vec![]);
        }

        let mut decoder = DeflateDecoder::new(*self);
        let mut data = vec![];
        decoder.read_to_end(&mut data).map_err(|_| CfgLibError::DataCannotBeDecompressed)?;
        Ok(data)
    }
}
