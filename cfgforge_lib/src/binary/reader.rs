//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the [`ReadBytes`] trait, to read bytes to known types.

use byteorder::{LittleEndian, ReadBytesExt};

use std::io::{Read, Seek, SeekFrom};

use crate::error::{CfgLibError, Result};

//---------------------------------------------------------------------------//
//                            Trait Definition
//---------------------------------------------------------------------------//

/// This trait allow us to easily read all kind of data from a source that implements [`Read`] + [`Seek`].
pub trait ReadBytes: Read + Seek {

    /// This function returns the length of the data we're reading.
    fn len(&mut self) -> Result<u64> {
        let old_pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        // Avoid seeking a third time when we were already at the end of the
        // stream. The branch is usually way cheaper than a seek operation.
        if old_pos != len {
            self.seek(SeekFrom::Start(old_pos))?;
        }
        Ok(len)
    }

    /// This function returns if the data is empty.
    fn is_empty(&mut self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// This function returns the amount of bytes specified in the `size` argument as a [`Vec<u8>`].
    ///
    /// If `rewind` is true, the cursor will be reset to its original position once the data is returned.
    fn read_slice(&mut self, size: usize, rewind: bool) -> Result<Vec<u8>> {
        let mut data = vec![0; size];

        // If len is 0, just return.
        if size == 0 {
            return Ok(data)
        }

        self.read_exact(&mut data).map_err(|error| match error.kind() {
            std::io::ErrorKind::UnexpectedEof => CfgLibError::DecodingNoMoreBytesToDecode,
            _ => CfgLibError::from(error),
        })?;

        if rewind {
            self.seek(SeekFrom::Current(-(size as i64)))?;
        }

        Ok(data)
    }

    /// This function tries to read a bool value from `self`.
    ///
    /// This is simple: 0 is false, 1 is true. Anything else is an error.
    fn read_bool(&mut self) -> Result<bool> {
        let value = self.read_u8()?;
        match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CfgLibError::DecodingBoolError(value)),
        }
    }

    /// This function tries to read an u8 value from `self`.
    fn read_u8(&mut self) -> Result<u8> {
        ReadBytesExt::read_u8(self).map_err(From::from)
    }

    /// This function tries to read an u16 value from `self`.
    fn read_u16(&mut self) -> Result<u16> {
        ReadBytesExt::read_u16::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u32 value from `self`.
    fn read_u32(&mut self) -> Result<u32> {
        ReadBytesExt::read_u32::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u64 value from `self`.
    fn read_u64(&mut self) -> Result<u64> {
        ReadBytesExt::read_u64::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u128 value from `self`.
    ///
    /// Content hashes are stored on disk in this format.
    fn read_u128(&mut self) -> Result<u128> {
        ReadBytesExt::read_u128::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i32 value from `self`.
    fn read_i32(&mut self) -> Result<i32> {
        ReadBytesExt::read_i32::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i64 value from `self`.
    fn read_i64(&mut self) -> Result<i64> {
        ReadBytesExt::read_i64::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read a f32 value from `self`.
    fn read_f32(&mut self) -> Result<f32> {
        ReadBytesExt::read_f32::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read a f64 value from `self`.
    fn read_f64(&mut self) -> Result<f64> {
        ReadBytesExt::read_f64::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an UTF-8 String of the provided size from `self`.
    fn read_string_u8(&mut self, size: usize) -> Result<String> {
        let data = self.read_slice(size, false)?;
        String::from_utf8(data).map_err(From::from)
    }

    /// This function tries to read a Sized StringU8 from `self`.
    ///
    /// The first two bytes are the length of the string, in bytes.
    fn read_sized_string_u8(&mut self) -> Result<String> {
        let size = self.read_u16().map_err(|_| CfgLibError::DecodingStringSizeError("Sized StringU8".to_owned()))?;
        self.read_string_u8(size as usize)
    }
}

// Automatic implementation for everything implementing `Read + Seek`.
impl<R: Read + Seek> ReadBytes for R {}
