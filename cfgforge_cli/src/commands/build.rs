//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the `build` command's functions.

use anyhow::{Context, Result};
use log::info;
use serde_derive::{Deserialize, Serialize};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cfgforge_lib::archive::{Archive, Decodeable, Encodeable};
use cfgforge_lib::build::{BuildParameters, GameConfigBuilder, SheetSource};
use cfgforge_lib::schema::SchemaRegistry;
use cfgforge_lib::sheets::Spreadsheet;

use crate::config::Config;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// A build manifest: what to build, from which sheets, against which schema.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildManifest {

    /// Path of the schema registry file, relative to the manifest.
    pub schema: PathBuf,

    /// The input sheets, one per config entry.
    pub sources: Vec<ManifestSource>,

    /// Entries at least this big get deflated. Uses the lib default when unset.
    pub min_compress_size: Option<usize>,
}

/// One input sheet of a manifest.
#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestSource {

    /// Name of the config entry the sheet feeds.
    pub entry: String,

    /// Path of the CSV file, relative to the manifest.
    pub file: PathBuf,
}

//---------------------------------------------------------------------------//
//                              Command functions
//---------------------------------------------------------------------------//

/// This function builds an archive from a manifest and writes it to disk.
pub fn build(config: &Config, manifest_path: &Path, output: &Path, parent: Option<&Path>) -> Result<()> {
    if config.verbosity_level > 0 {
        info!("Building archive from the manifest: {}.", manifest_path.display());
    }

    let manifest = load_manifest(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or(Path::new("."));

    let registry = SchemaRegistry::load(&base_dir.join(&manifest.schema))
        .with_context(|| format!("failed to load the schema registry {}", manifest.schema.display()))?;

    let mut sources = vec![];
    for source in &manifest.sources {
        let path = base_dir.join(&source.file);
        let sheet = Spreadsheet::from_csv_path(&path)
            .with_context(|| format!("failed to load the sheet {}", path.display()))?;
        sources.push(SheetSource::new(&source.entry, sheet));
    }

    let parent_archive = match parent {
        Some(path) => {
            let mut reader = BufReader::new(File::open(path)?);
            Some(Archive::decode(&mut reader, &None)?)
        },
        None => None,
    };

    let builder = GameConfigBuilder::new(Arc::new(registry));
    let output_result = builder.build(BuildParameters {
        sources,
        min_compress_size: manifest.min_compress_size,
        parent_version: parent_archive.as_ref().map(|archive| *archive.version()),
        parent: parent_archive,
        ..Default::default()
    })?;

    let mut archive = output_result.archive().clone();
    let mut writer = BufWriter::new(File::create(output)?);
    let mut data = vec![];
    archive.encode(&mut data, &None)?;
    writer.write_all(&data)?;

    println!("{}", output_result.report());
    println!("Archive written to {} (version {}).", output.display(), archive.version());
    Ok(())
}

/// This function loads and parses a build manifest.
fn load_manifest(path: &Path) -> Result<BuildManifest> {
    let mut data = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut data)?;
    ron::from_str(&data).with_context(|| format!("failed to parse the manifest {}", path.display()))
}
