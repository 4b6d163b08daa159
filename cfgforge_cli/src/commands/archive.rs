//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the `archive` command's functions.

use anyhow::Result;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use cfgforge_lib::archive::{Archive, Decodeable, EXTENSION};
use cfgforge_lib::build::{BuildMetadata, METADATA_ENTRY_NAME};

use crate::config::Config;

//---------------------------------------------------------------------------//
//                              Command functions
//---------------------------------------------------------------------------//

/// This function lists the entries of an archive, descending into nested archives.
pub fn list(config: &Config, path: &Path) -> Result<()> {
    if config.verbosity_level > 0 {
        info!("Listing the contents of the archive: {}.", path.display());
    }

    let archive = open(path)?;
    for name in archive.entry_names() {
        let size = archive.bytes(name)?.len();
        println!("{name} ({size} bytes)");

        if name.ends_with(EXTENSION) {
            let nested = Archive::decode(&mut archive.reader(name)?, &None)?;
            for nested_name in nested.entry_names() {
                let nested_size = nested.bytes(nested_name)?.len();
                println!("  {nested_name} ({nested_size} bytes)");
            }
        }
    }
    Ok(())
}

/// This function prints the version info and metadata of an archive.
pub fn inspect(config: &Config, path: &Path) -> Result<()> {
    if config.verbosity_level > 0 {
        info!("Inspecting the archive: {}.", path.display());
    }

    let archive = open(path)?;
    println!("Schema version: {}", archive.schema_version());
    println!("Archive version: {}", archive.version());
    println!("Created at: {} (epoch micros)", archive.created_at());
    println!("Entries: {}", archive.entries().len());

    if archive.contains(METADATA_ENTRY_NAME) {
        let metadata: BuildMetadata = serde_json::from_slice(archive.bytes(METADATA_ENTRY_NAME)?)?;
        println!("Built entries: {}", metadata.built_entries.join(", "));
        println!("Report: {} errors, {} warnings", metadata.num_errors, metadata.num_warnings);
        if let Some(parent_version) = metadata.parent_version {
            println!("Parent version: {parent_version}");
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<Archive> {
    let mut reader = BufReader::new(File::open(path)?);
    Ok(Archive::decode(&mut reader, &None)?)
}
