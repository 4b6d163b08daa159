//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the runtime import: archive in, deduplicating store out.
//!
//! This is the path game clients and servers run on startup: decode the baseline entries of
//! their scope, then feed every patch envelope into the store in archive order, so any variant
//! specialization can be materialized on demand.

use std::io::Cursor;
use std::sync::Arc;

use crate::archive::{Archive, Decodeable};
use crate::build::{SERVER_ARCHIVE_NAME, SHARED_ARCHIVE_NAME, parse_patch_envelope_name};
use crate::dedup::{DeduplicationStorage, PostLoadRegistry};
use crate::error::Result;
use crate::items::GameConfig;
use crate::schema::{EntryKind, EntryScope, SchemaRegistry};
use crate::tagged::TaggedCodec;

//---------------------------------------------------------------------------//
//                              Import functions
//---------------------------------------------------------------------------//

/// This function decodes the baseline config of one scope out of an archive.
pub fn load_game_config(archive: &Archive, registry: &SchemaRegistry, scope: EntryScope) -> Result<GameConfig> {
    let nested_name = match scope {
        EntryScope::Shared => SHARED_ARCHIVE_NAME,
        EntryScope::Server => SERVER_ARCHIVE_NAME,
    };

    let mut config = GameConfig::new();
    if !archive.contains(nested_name) {
        return Ok(config);
    }

    let nested = Archive::decode(&mut archive.reader(nested_name)?, &None)?;
    let codec = TaggedCodec::new(registry);

    for entry in registry.entries().values() {
        if *entry.scope() != scope || !nested.contains(&entry.entry_file_name()) {
            continue;
        }

        match entry.kind() {
            EntryKind::Library => {
                let mut library = codec.decode_library(entry, &mut nested.reader(&entry.entry_file_name())?)?;

                // Aliases live in a companion entry. The legacy table mapped real key to alias
                // and gets inverted on read.
                let aliases = if nested.contains(&entry.alias_table_file_name()) {
                    TaggedCodec::decode_alias_table(&mut nested.reader(&entry.alias_table_file_name())?, false)?
                } else if nested.contains(&entry.legacy_alias_table_file_name()) {
                    TaggedCodec::decode_alias_table(&mut nested.reader(&entry.legacy_alias_table_file_name())?, true)?
                } else {
                    Default::default()
                };
                for (alias, real_key) in &aliases {
                    library.insert_alias(alias, real_key);
                }

                config.insert_library(library);
            },
            EntryKind::KeyValue => {
                let structure = codec.decode_key_value(entry, &mut nested.reader(&entry.entry_file_name())?)?;
                config.insert_key_value(structure);
            },
        }
    }

    Ok(config)
}

/// This function builds the full deduplicating store of one scope out of an archive: baseline
/// plus every patch envelope, imported in archive order.
pub fn load_deduplication_storage(
    archive: &Archive,
    registry: &Arc<SchemaRegistry>,
    scope: EntryScope,
    hooks: &PostLoadRegistry,
) -> Result<Arc<DeduplicationStorage>> {
    let baseline = load_game_config(archive, registry, scope)?;
    let mut storage = DeduplicationStorage::from_baseline(registry.clone(), baseline, hooks)?;

    for name in archive.entry_names() {
        let (envelope_scope, pair) = match parse_patch_envelope_name(name) {
            Some(parsed) => parsed,
            None => continue,
        };
        if envelope_scope != scope {
            continue;
        }

        let envelope = TaggedCodec::decode_envelope(&mut Cursor::new(archive.bytes(name)?))?;
        storage.import_patch(&pair, &envelope, hooks)?;
    }

    Ok(Arc::new(storage))
}
