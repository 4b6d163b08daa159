//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the build orchestration: sheets in, archive out.
//!
//! The pipeline per entry: split, post-process, bind the baseline and every variant, diff the
//! variants into patches. Then a gate, the deduplicating store is constructed, every variant is
//! validated in parallel, and the archive is assembled.
//!
//! # Persisted layout
//!
//! | Entry | Content |
//! | ----- | ------- |
//! | `Shared.mpa` | nested archive with every shared `<Entry>.mpc` (+ alias tables) |
//! | `Server.mpa` | the same for server-only entries |
//! | `SharedPatch.<exp>.<variant>.mpp` | one patch envelope per variant, shared scope |
//! | `ServerPatch.<exp>.<variant>.mpp` | the same for server scope |
//! | `_metadata` | build parameters and report summary, JSON |
//!
//! `_metadata` lands last because entry names sort byte-wise and `_` sorts after the uppercase
//! entry names.

use getset::Getters;
use indexmap::IndexMap;
use ::log::info;
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::archive::{Archive, Decodeable, Encodeable, EncodeableExtraData};
use crate::bind::{Binder, UnknownMemberPolicy};
use crate::dedup::{DeduplicationStorage, GameConfigSpecialization, PostLoadRegistry};
use crate::error::{CfgLibError, Result};
use crate::hashing::ContentHash;
use crate::items::{ConfigItem, ExperimentVariantPair, GameConfig, KeyValueStructure, Library};
use crate::patch::{EntryPatch, LibraryPatch, PatchEnvelope, StructurePatch, check_variant_append_order};
use crate::schema::{EntryKind, EntrySchema, EntryScope, SchemaRegistry};
use crate::sheets::Spreadsheet;
use crate::sheets::postprocess::*;
use crate::sheets::splitter::{split_key_value_items, split_library_items};
use crate::sheets::syntax::RootObject;
use crate::tagged::TaggedCodec;

pub mod import;
pub mod log;

pub use self::log::{BuildLog, BuildMessage, BuildReport, MessageLevel};

#[cfg(test)] mod build_test;

/// Name of the nested archive with the shared entries.
pub const SHARED_ARCHIVE_NAME: &str = "Shared.mpa";

/// Name of the nested archive with the server-only entries.
pub const SERVER_ARCHIVE_NAME: &str = "Server.mpa";

/// Name of the metadata entry.
pub const METADATA_ENTRY_NAME: &str = "_metadata";

/// Extension of patch envelope entries.
pub const PATCH_EXTENSION: &str = ".mpp";

const SHARED_PATCH_PREFIX: &str = "SharedPatch.";
const SERVER_PATCH_PREFIX: &str = "ServerPatch.";

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// One input sheet, already loaded, addressed to one config entry.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct SheetSource {
    entry_name: String,
    sheet: Spreadsheet,
}

/// Everything one build needs to know.
#[derive(Clone, Debug, Default)]
pub struct BuildParameters {

    /// Creation time of the archive, microseconds since the unix epoch. Now when unset.
    pub created_at: Option<i64>,

    /// The input sheets.
    pub sources: Vec<SheetSource>,

    /// What to do with sheet members the schema does not know.
    pub unknown_member_policy: UnknownMemberPolicy,

    /// Entries at least this big get deflated. Default when unset.
    pub min_compress_size: Option<usize>,

    /// Version of the parent archive, recorded in the metadata.
    pub parent_version: Option<ContentHash>,

    /// Parent archive for incremental builds: entries of the registry with no source sheet are
    /// copied forward from it by name.
    pub parent: Option<Archive>,
}

/// A successful build: the archive plus the full report.
#[derive(Getters)]
#[getset(get = "pub")]
pub struct BuildOutput {
    archive: Archive,
    report: BuildReport,
    storage: Arc<DeduplicationStorage>,
}

/// The `_metadata` payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub created_at: i64,
    pub parent_version: Option<String>,
    pub built_entries: Vec<String>,
    pub num_errors: usize,
    pub num_warnings: usize,
    pub report: BuildReport,
}

/// Cooperative cancellation token for the validation fan-out.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

/// Per-config validators, run against every variant specialization.
pub type ValidatorFn = Arc<dyn Fn(&ExperimentVariantPair, &GameConfigSpecialization, &mut BuildLog) + Send + Sync>;

/// The engine handle: registry, hooks and validators, threaded explicitly through every
/// build-time API. There are no global singletons to look up.
pub struct GameConfigBuilder {
    registry: Arc<SchemaRegistry>,
    post_load: PostLoadRegistry,
    validators: Vec<ValidatorFn>,
    cancellation: CancellationToken,
}

/// Per-entry result of the parse-and-bind stage.
struct BoundEntry {
    entry: EntrySchema,
    baseline_library: Option<Library>,
    baseline_key_value: Option<KeyValueStructure>,
    variant_roots: Vec<RootObject>,
    library_patches: IndexMap<ExperimentVariantPair, LibraryPatch>,
    structure_patches: IndexMap<ExperimentVariantPair, StructurePatch>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl SheetSource {

    /// This function builds a source from an entry name and its sheet.
    pub fn new(entry_name: &str, sheet: Spreadsheet) -> Self {
        Self { entry_name: entry_name.to_owned(), sheet }
    }
}

impl CancellationToken {

    /// This function requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// This function returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// This function builds the archive entry name of one variant's patch envelope.
pub fn patch_envelope_name(scope: EntryScope, pair: &ExperimentVariantPair) -> String {
    let prefix = match scope {
        EntryScope::Shared => SHARED_PATCH_PREFIX,
        EntryScope::Server => SERVER_PATCH_PREFIX,
    };
    format!("{prefix}{}.{}{PATCH_EXTENSION}", pair.experiment_id(), pair.variant_id())
}

/// This function parses a patch envelope entry name back into its scope and variant.
pub fn parse_patch_envelope_name(name: &str) -> Option<(EntryScope, ExperimentVariantPair)> {
    let (scope, rest) = if let Some(rest) = name.strip_prefix(SHARED_PATCH_PREFIX) {
        (EntryScope::Shared, rest)
    } else if let Some(rest) = name.strip_prefix(SERVER_PATCH_PREFIX) {
        (EntryScope::Server, rest)
    } else {
        return None;
    };

    let rest = rest.strip_suffix(PATCH_EXTENSION)?;
    let (experiment_id, variant_id) = rest.split_once('.')?;
    Some((scope, ExperimentVariantPair::new(experiment_id, variant_id)))
}

impl GameConfigBuilder {

    /// This function creates a builder over the provided registry.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            post_load: PostLoadRegistry::new(),
            validators: vec![],
            cancellation: CancellationToken::default(),
        }
    }

    /// This function registers a post-load hook for one entry.
    pub fn with_post_load(mut self, entry_name: &str, hook: crate::dedup::PostLoadFn) -> Self {
        self.post_load.insert(entry_name.to_owned(), hook);
        self
    }

    /// This function registers a validator, run against the baseline and every variant.
    pub fn with_validator(mut self, validator: ValidatorFn) -> Self {
        self.validators.push(validator);
        self
    }

    /// This function returns the cancellation token of this builder.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// This function runs a full build.
    ///
    /// Parse and bind problems accumulate in the log until the gate after binding; the store
    /// construction and validation failures gate separately, so the report distinguishes a
    /// broken sheet from a broken experiment.
    pub fn build(&self, parameters: BuildParameters) -> Result<BuildOutput> {
        let mut log = BuildLog::new();

        // Stage 1: parse, post-process, bind, diff.
        let mut bound_entries = vec![];
        for source in &parameters.sources {
            match self.registry.entry(source.entry_name()) {
                Ok(entry) => {
                    let entry = entry.clone();
                    bound_entries.push(self.bind_source(&entry, source.sheet(), parameters.unknown_member_policy, &mut log));
                },
                Err(error) => log.error(&error.to_string(), Some(source.sheet().full_location())),
            }
        }

        // Stage 2: reference validation, with source locations, before anything is assembled.
        self.validate_refs(&bound_entries, &mut log);

        if log.has_errors() {
            return Err(CfgLibError::BuildFailed(Box::new(log.into_report())));
        }

        // Stage 3: baseline config and the deduplicating store.
        let mut baseline = GameConfig::new();
        for bound in &bound_entries {
            if let Some(library) = &bound.baseline_library {
                baseline.insert_library(library.clone());
            }
            if let Some(structure) = &bound.baseline_key_value {
                baseline.insert_key_value(structure.clone());
            }
        }

        let codec = TaggedCodec::new(&self.registry);
        let mut envelopes: IndexMap<(EntryScope, ExperimentVariantPair), PatchEnvelope> = IndexMap::new();
        for bound in &bound_entries {
            let scope = *bound.entry.scope();
            for (pair, patch) in &bound.library_patches {
                let bytes = codec.encode_entry_patch(&EntryPatch::Library(patch.clone()))?;
                envelopes.entry((scope, pair.clone())).or_default().insert(bound.entry.name(), bytes);
            }
            for (pair, patch) in &bound.structure_patches {
                let bytes = codec.encode_entry_patch(&EntryPatch::Structure(patch.clone()))?;
                envelopes.entry((scope, pair.clone())).or_default().insert(bound.entry.name(), bytes);
            }
        }

        let mut storage = DeduplicationStorage::from_baseline(self.registry.clone(), baseline, &self.post_load)
            .map_err(|error| self.storage_failure(error, &log))?;

        let variant_pairs = envelopes.keys()
            .map(|(_, pair)| pair.clone())
            .collect::<indexmap::IndexSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        for pair in &variant_pairs {
            let mut merged = PatchEnvelope::new();
            for ((_, envelope_pair), envelope) in &envelopes {
                if envelope_pair == pair {
                    for (entry_name, bytes) in envelope.entries() {
                        merged.insert(entry_name, bytes.clone());
                    }
                }
            }
            storage.import_patch(pair, &merged, &self.post_load)
                .map_err(|error| self.storage_failure(error, &log))?;
        }
        let storage = Arc::new(storage);

        // Stage 4: validate the baseline and every variant, in parallel. Each task builds its
        // own specialization and writes into its own log.
        let mut validation_targets = vec![None];
        validation_targets.extend(variant_pairs.iter().cloned().map(Some));

        let validation_logs = validation_targets.par_iter()
            .map(|pair| -> Result<BuildLog> {
                if self.cancellation.is_cancelled() {
                    return Err(CfgLibError::BuildCancelled);
                }

                let mut variant_log = BuildLog::new();
                let (label, active) = match pair {
                    Some(pair) => (pair.to_string(), std::slice::from_ref(pair)),
                    None => ("baseline".to_owned(), &[] as &[ExperimentVariantPair]),
                };

                let specialization = DeduplicationStorage::specialize(&storage, active, &self.post_load)?;
                let pair_for_validators = pair.clone().unwrap_or_else(|| ExperimentVariantPair::new("", ""));
                for validator in &self.validators {
                    validator(&pair_for_validators, &specialization, &mut variant_log);
                }

                if variant_log.has_errors() {
                    variant_log.info(&format!("Validation of {label} failed."), None);
                }
                Ok(variant_log)
            })
            .collect::<Vec<_>>();

        for variant_log in validation_logs {
            match variant_log {
                Ok(mut variant_log) => log.append(&mut variant_log),
                Err(CfgLibError::BuildCancelled) => return Err(CfgLibError::BuildCancelled),
                Err(error) => log.error(&error.to_string(), None),
            }
        }

        if log.has_errors() {
            return Err(CfgLibError::ValidationFailed(Box::new(log.into_report())));
        }

        // Stage 5: assemble the archive.
        let created_at = match parameters.created_at {
            Some(created_at) => created_at,
            None => crate::utils::current_time_micros()?,
        };
        let min_compress_size = parameters.min_compress_size.unwrap_or(crate::archive::DEFAULT_MIN_COMPRESS_SIZE);
        let encode_extra = EncodeableExtraData { min_compress_size };

        let mut archive = Archive::new(created_at);
        let built_entries = bound_entries.iter().map(|bound| bound.entry.name().clone()).collect::<Vec<_>>();

        for scope in [EntryScope::Shared, EntryScope::Server] {
            let mut nested = Archive::new(created_at);

            for bound in &bound_entries {
                if *bound.entry.scope() != scope {
                    continue;
                }
                if let Some(library) = &bound.baseline_library {
                    nested.insert(&bound.entry.entry_file_name(), codec.encode_library(library)?);
                    if !library.aliases().is_empty() {
                        nested.insert(&bound.entry.alias_table_file_name(), TaggedCodec::encode_alias_table(library.aliases())?);
                    }
                }
                if let Some(structure) = &bound.baseline_key_value {
                    nested.insert(&bound.entry.entry_file_name(), codec.encode_key_value(structure)?);
                }
            }

            // Incremental: entries of this scope with no source sheet come from the parent.
            if let Some(parent) = &parameters.parent {
                self.copy_forward(parent, scope, &built_entries, &mut nested, &mut log)?;
            }

            let mut nested_bytes = vec![];
            nested.encode(&mut nested_bytes, &Some(encode_extra))?;
            let name = match scope {
                EntryScope::Shared => SHARED_ARCHIVE_NAME,
                EntryScope::Server => SERVER_ARCHIVE_NAME,
            };
            archive.insert(name, nested_bytes);
        }

        for ((scope, pair), envelope) in &envelopes {
            if !envelope.is_empty() {
                archive.insert(&patch_envelope_name(*scope, pair), TaggedCodec::encode_envelope(envelope)?);
            }
        }

        let report = log.into_report();
        let metadata = BuildMetadata {
            created_at,
            parent_version: parameters.parent_version.map(|version| version.to_string()),
            built_entries,
            num_errors: *report.num_errors(),
            num_warnings: *report.num_warnings(),
            report: report.clone(),
        };
        archive.insert(METADATA_ENTRY_NAME, serde_json::to_vec_pretty(&metadata)?);

        info!("Build finished: {} entries, version {}.", archive.entries().len(), archive.compute_version());
        Ok(BuildOutput { archive, report, storage })
    }

    /// Parses, post-processes, binds and diffs one source sheet.
    fn bind_source(&self, entry: &EntrySchema, sheet: &Spreadsheet, policy: UnknownMemberPolicy, log: &mut BuildLog) -> BoundEntry {
        let binder = Binder::new(&self.registry, policy);
        let mut bound = BoundEntry {
            entry: entry.clone(),
            baseline_library: None,
            baseline_key_value: None,
            variant_roots: vec![],
            library_patches: IndexMap::new(),
            structure_patches: IndexMap::new(),
        };

        match entry.kind() {
            EntryKind::Library => {
                let mut roots = split_library_items(sheet, log);
                for root in &mut roots {
                    extract_aliases(root, log);
                }
                let mut roots = extract_variants(roots);
                detect_duplicate_objects(&roots, log);
                inherit_variant_values_from_baseline(&mut roots);

                let baseline = binder.bind_library(entry, &roots, log);
                check_variant_append_order(&roots, &baseline, log);

                let variant_ids = roots.iter()
                    .filter_map(|root| root.variant_id().clone())
                    .collect::<indexmap::IndexSet<_>>();
                for variant_id in &variant_ids {
                    let items = binder.bind_variant_items(entry, &roots, variant_id, log);
                    let patch = LibraryPatch::from_diff(&baseline, &items);
                    if !patch.is_empty() {
                        bound.library_patches.insert(ExperimentVariantPair::parse(variant_id), patch);
                    }
                }

                bound.variant_roots = roots;
                bound.baseline_library = Some(baseline);
            },
            EntryKind::KeyValue => {
                let roots = split_key_value_items(sheet, log);
                let mut roots = extract_variants(roots);
                inherit_key_value_variant_values_from_baseline(&mut roots);

                let baseline_root = roots.iter().find(|root| root.variant_id().is_none());
                let baseline = match baseline_root {
                    Some(root) => binder.bind_key_value(entry, root, log),
                    None => KeyValueStructure::default(),
                };

                if let Ok(schema) = self.registry.item_type_of(entry) {
                    for root in &roots {
                        let variant_id = match root.variant_id() {
                            Some(variant_id) => variant_id,
                            None => continue,
                        };
                        let overlay = binder.bind_key_value(entry, root, log);
                        let patch = StructurePatch::from_diff(&baseline, &overlay, schema);
                        if !patch.is_empty() {
                            bound.structure_patches.insert(ExperimentVariantPair::parse(variant_id), patch);
                        }
                    }
                }

                bound.variant_roots = roots;
                bound.baseline_key_value = Some(baseline);
            },
        }

        bound
    }

    /// Validates every reference of every bound item, with source locations.
    ///
    /// A baseline item may reference any baseline key or alias; a variant item may additionally
    /// reference keys its own variant appends.
    fn validate_refs(&self, bound_entries: &[BoundEntry], log: &mut BuildLog) {
        let baseline_resolves = |entry_name: &str, raw_key: &str| -> bool {
            bound_entries.iter()
                .filter_map(|bound| bound.baseline_library.as_ref())
                .find(|library| library.entry_name() == entry_name)
                .is_some_and(|library| library.resolve_key(raw_key).is_some())
        };
        let variant_appends = |entry_name: &str, raw_key: &str, variant_id: &str| -> bool {
            let pair = ExperimentVariantPair::parse(variant_id);
            bound_entries.iter()
                .filter(|bound| bound.entry.name() == entry_name)
                .filter_map(|bound| bound.library_patches.get(&pair))
                .any(|patch| patch.contains_appended(raw_key))
        };

        for bound in bound_entries {
            for root in &bound.variant_roots {
                let item_refs = self.root_refs(bound, root);
                for (target_entry, raw_key) in item_refs {
                    if self.registry.entries().get(&target_entry).is_none() {
                        log.error(
                            &format!("The item \"{}\" references the unknown library \"{target_entry}\".", root.key()),
                            Some(root.location().clone()),
                        );
                        continue;
                    }

                    let resolvable = baseline_resolves(&target_entry, &raw_key)
                        || root.variant_id().as_deref().is_some_and(|variant_id| variant_appends(&target_entry, &raw_key, variant_id));
                    if !resolvable {
                        log.error(
                            &format!("The item \"{}\" references \"{target_entry}[{raw_key}]\", which does not exist.", root.key()),
                            Some(root.location().clone()),
                        );
                    }
                }
            }
        }
    }

    /// The raw references of the bound item matching one root.
    fn root_refs(&self, bound: &BoundEntry, root: &RootObject) -> Vec<(String, String)> {
        let item: Option<&Arc<ConfigItem>> = match root.variant_id() {
            None => bound.baseline_library.as_ref().and_then(|library| library.get(&root.key())),
            Some(variant_id) => {
                let pair = ExperimentVariantPair::parse(variant_id);
                bound.library_patches.get(&pair).and_then(|patch| patch.resolve(&root.key()))
            },
        };

        let mut refs = vec![];
        if let Some(item) = item {
            item.walk_refs(&mut |meta_ref| refs.push((meta_ref.target_entry().to_owned(), meta_ref.raw_key().to_owned())));
        } else if let Some(structure) = &bound.baseline_key_value {
            if root.variant_id().is_none() {
                for value in structure.values().values() {
                    value.walk_refs(&mut |meta_ref| refs.push((meta_ref.target_entry().to_owned(), meta_ref.raw_key().to_owned())));
                }
            }
        }
        refs
    }

    /// Copies entries of the registry that were not built this time forward from the parent.
    fn copy_forward(&self, parent: &Archive, scope: EntryScope, built_entries: &[String], nested: &mut Archive, log: &mut BuildLog) -> Result<()> {
        let name = match scope {
            EntryScope::Shared => SHARED_ARCHIVE_NAME,
            EntryScope::Server => SERVER_ARCHIVE_NAME,
        };
        if !parent.contains(name) {
            return Ok(());
        }

        let parent_nested = Archive::decode(&mut parent.reader(name)?, &None)?;
        for entry in self.registry.entries().values() {
            if *entry.scope() != scope || built_entries.contains(entry.name()) {
                continue;
            }
            for candidate in [entry.entry_file_name(), entry.alias_table_file_name(), entry.legacy_alias_table_file_name()] {
                if parent_nested.contains(&candidate) {
                    nested.insert(&candidate, parent_nested.bytes(&candidate)?.to_vec());
                    log.info(&format!("Copied \"{candidate}\" forward from the parent archive."), None);
                }
            }
        }
        Ok(())
    }

    fn storage_failure(&self, error: CfgLibError, log: &BuildLog) -> CfgLibError {
        let mut log = log.clone();
        log.error(&error.to_string(), None);
        CfgLibError::BuildFailed(Box::new(log.into_report()))
    }
}
