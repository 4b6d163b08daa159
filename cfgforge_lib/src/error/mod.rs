//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains all kind of errors used inside this crate.
//!
//! Note that recoverable pipeline diagnostics (bad headers, duplicate keys,...) are NOT here:
//! those are accumulated as [`BuildMessage`](crate::build::BuildMessage) in the build log, and
//! only surface as a [`CfgLibError::BuildFailed`] at a gate.

use thiserror::Error;

use crate::build::BuildReport;

/// Custom `Result` type, to always return our custom error.
pub type Result<T, E = CfgLibError> = core::result::Result<T, E>;

/// Custom error type for the lib.
#[derive(Error, Debug)]
pub enum CfgLibError {
    #[error("This is a compressed entry and the decompression failed for some reason. This means this entry cannot be read.")]
    DataCannotBeDecompressed,

    #[error("There are no more bytes to decode in the data you provided.")]
    DecodingNoMoreBytesToDecode,

    #[error("Error trying to decode \"{0}\" as boolean: invalid value.")]
    DecodingBoolError(u8),

    #[error("Error trying to convert the following value to a bool: {0}.")]
    ParseBoolError(String),

    #[error("Error trying to decode an {0}: Not enough bytes to get his size.")]
    DecodingStringSizeError(String),

    #[error(transparent)]
    DecodeIntError(#[from] std::num::ParseIntError),

    #[error(transparent)]
    DecodeFloatError(#[from] std::num::ParseFloatError),

    #[error(transparent)]
    DecodeUTF8Error(#[from] std::string::FromUtf8Error),

    #[error("The header of the Archive is incomplete, unsupported or damaged.")]
    ArchiveHeaderNotComplete,

    #[error("Unknown Archive schema version: {0}.")]
    UnknownArchiveSchemaVersion(u32),

    #[error("Unknown compression format byte: {0}.")]
    UnknownCompressionFormat(u8),

    #[error("The entry \"{0}\" was not found in the Archive.")]
    ArchiveEntryNotFound(String),

    #[error("The entry \"{0}\" failed its content hash check: the Archive is damaged.")]
    ArchiveEntryHashMismatch(String),

    #[error("Unknown wire type byte: {0}.")]
    UnknownWireType(u8),

    #[error("Wire type mismatch: expected {expected}, found {found}.")]
    WireTypeMismatch { expected: String, found: String },

    #[error("The patch for entry \"{0}\" replaces the key \"{1}\", which does not exist in the baseline.")]
    PatchReplacedKeyMissing(String, String),

    #[error("The patch for entry \"{0}\" appends the key \"{1}\", which already exists in the baseline.")]
    PatchAppendedKeyExists(String, String),

    #[error("The patch payload for entry \"{entry}\" is of an incompatible type: expected {expected}, found {found}.")]
    PatchTypeMismatch { entry: String, expected: String, found: String },

    #[error("The member \"{1}\" is not part of the structure \"{0}\".")]
    UnknownStructureMember(String, String),

    #[error("The entry \"{0}\" is not declared in the schema registry.")]
    UnknownEntry(String),

    #[error("The struct type \"{0}\" is not declared in the schema registry.")]
    UnknownStructType(String),

    #[error("Unsupported schema registry file version: {0}.")]
    UnsupportedSchemaRegistryVersion(u32),

    #[error("The key \"{1}\" cannot be resolved in the library \"{0}\".")]
    UnresolvableKey(String, String),

    #[error("The blob \"{0}\" was fetched with version {1}, but version {2} was requested.")]
    BlobVersionMismatch(String, String, String),

    #[error("The blob \"{0}\" was not found on the provider.")]
    BlobNotFound(String),

    #[error("Transport error while fetching the blob \"{0}\": {1}.")]
    BlobTransportError(String, String),

    #[error("This provider does not support writes.")]
    BlobWritesUnsupported,

    #[error("The fetched blob \"{0}\" decoded to an empty payload.")]
    BlobEmptyPayload(String),

    #[error("The build failed. Check the report for details:\n{0}")]
    BuildFailed(Box<BuildReport>),

    #[error("The build produced a valid archive candidate, but validation failed:\n{0}")]
    ValidationFailed(Box<BuildReport>),

    #[error("The build was cancelled.")]
    BuildCancelled,

    #[error("Invariant violated: {0}. This is a bug in the caller or in this lib, please report it.")]
    InvariantViolated(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    CsvError(#[from] csv::Error),

    #[error(transparent)]
    RonError(#[from] ron::error::Error),

    #[error(transparent)]
    RonSpannedError(#[from] ron::error::SpannedError),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
}
