//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the deduplicating runtime store: one instance of every distinct item definition,
//! shared across every specialization that agrees on it.
//!
//! The store is built write-once: baseline first, then every patch in sequence. After that it is
//! read-only, and any number of specializations can be materialized from it concurrently without
//! locks.
//!
//! The subtle part is reference consistency. An item is cheap to share between the baseline and
//! a specialization as long as everything it references resolves to the same instances in both.
//! The moment a patch redefines an item, everything that references it (transitively, through
//! the reverse-reference graph) must be duplicated for that specialization, or a shared item
//! would leak a reference into the wrong world. The duplication pass here computes exactly that
//! closure and nothing more.

use getset::Getters;
use indexmap::{IndexMap, IndexSet};
use log::info;

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{CfgLibError, Result};
use crate::items::{ConfigItem, ConfigItemId, ExperimentVariantPair, GameConfig, KeyValueStructure, MetaRef};
use crate::patch::{EntryPatch, LibraryPatch, PatchEnvelope, StructurePatch};
use crate::schema::SchemaRegistry;
use crate::tagged::TaggedCodec;


/// Per-entry hooks run on owned items right before their references are resolved.
pub type PostLoadFn = Arc<dyn Fn(&mut ConfigItem) + Send + Sync>;

/// Registry of [`PostLoadFn`]s, keyed by entry name.
pub type PostLoadRegistry = HashMap<String, PostLoadFn>;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// Compact index of one patch within the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigPatchIndex(u32);

/// One item instance plus its outgoing references, canonicalized.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct ItemData {
    item: Arc<ConfigItem>,

    /// Canonical ids of every item this one references. `None` when it references nothing.
    references: Option<HashSet<ConfigItemId>>,
}

/// One patch's definition of one item.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct PatchOverride {
    patch_index: ConfigPatchIndex,
    data: ItemData,

    /// True when the patch explicitly defined this item; false for reference-driven clones.
    directly_patched: bool,
}

/// Every definition of one item key: the baseline one plus any patch overrides.
#[derive(Clone, Debug, Default, Getters)]
#[getset(get = "pub")]
pub struct PatchedItemEntry {

    /// The baseline definition. `None` when the key only exists through patch appends.
    baseline: Option<ItemData>,

    /// Patch definitions, in patch import order.
    overrides: Vec<PatchOverride>,
}

/// What one patch did to one library.
#[derive(Clone, Debug, Default, Getters)]
#[getset(get = "pub")]
pub struct PatchInfo {
    directly_patched: IndexSet<String>,
    indirectly_patched: IndexSet<String>,
    appended: IndexSet<String>,
}

/// The per-library half of the store.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct LibraryDeduplicationStorage {
    entry_name: String,
    item_type: String,

    /// Alias to real key, from the baseline.
    aliases: IndexMap<String, String>,

    /// One entry per key. Baseline keys first in sheet order, then patch-appended keys in patch
    /// import order.
    entries: IndexMap<String, PatchedItemEntry>,

    /// What each patch did to this library, by patch index.
    patch_infos: Vec<PatchInfo>,
}

/// The per-key-value-entry half of the store: the baseline structure plus each patch's
/// member replacements.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct KeyValueDeduplicationStorage {
    baseline: KeyValueStructure,
    patches: Vec<(ConfigPatchIndex, StructurePatch)>,
}

/// The top-level store: every library, every key-value entry, and the baseline reference graph.
#[derive(Getters)]
#[getset(get = "pub")]
pub struct DeduplicationStorage {
    registry: Arc<SchemaRegistry>,

    /// Patch identity to compact index, in import order.
    patch_id_to_index: IndexMap<ExperimentVariantPair, ConfigPatchIndex>,

    libraries: IndexMap<String, LibraryDeduplicationStorage>,
    key_values: IndexMap<String, KeyValueDeduplicationStorage>,

    /// Outgoing references of every baseline item.
    baseline_references: HashMap<ConfigItemId, HashSet<ConfigItemId>>,

    /// Reverse of [`Self::baseline_references`].
    baseline_reverse_references: HashMap<ConfigItemId, HashSet<ConfigItemId>>,
}

/// Who owns the clones a duplication pass produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DuplicationOwnership {

    /// A standalone multi-patch specialization: clones go to its exclusively-owned map.
    None,

    /// Initial store construction: clones become `indirectly_patched` overrides of the patch.
    SinglePatch(ConfigPatchIndex),
}

/// Where an item's active definition comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Definer {
    Baseline,
    Patch(ConfigPatchIndex),
}

/// One materialized config: the baseline plus a set of active patches, presented as if it were
/// an independent config while sharing unchanged items with the store.
#[derive(Getters)]
#[getset(get = "pub")]
pub struct GameConfigSpecialization {
    storage: Arc<DeduplicationStorage>,

    /// The active patches, in import order.
    active: Vec<ConfigPatchIndex>,

    /// Items cloned for this specialization alone. Looked up before the store.
    exclusively_owned: HashMap<ConfigItemId, Arc<ConfigItem>>,

    /// Key-value structures with all active patches applied.
    key_values: IndexMap<String, KeyValueStructure>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl ConfigPatchIndex {

    /// This function returns the raw index value.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl ItemData {

    fn new(item: Arc<ConfigItem>, references: Option<HashSet<ConfigItemId>>) -> Self {
        Self { item, references }
    }

    fn references_iter(&self) -> impl Iterator<Item = &ConfigItemId> {
        self.references.iter().flatten()
    }
}

impl PatchedItemEntry {

    /// The latest active override, direct ones taking priority over indirect ones.
    ///
    /// Direct-first makes the result match apply-patches-in-order-onto-baseline semantics;
    /// indirect clones only act as fallback to keep references consistent.
    fn active_override(&self, active: &[ConfigPatchIndex]) -> Option<&PatchOverride> {
        self.overrides.iter().rev()
            .filter(|slot| active.contains(&slot.patch_index))
            .find(|slot| slot.directly_patched)
            .or_else(|| self.overrides.iter().rev().find(|slot| active.contains(&slot.patch_index)))
    }

    fn active_data(&self, active: &[ConfigPatchIndex]) -> Option<(&ItemData, Definer)> {
        match self.active_override(active) {
            Some(slot) => Some((&slot.data, Definer::Patch(slot.patch_index))),
            None => self.baseline.as_ref().map(|data| (data, Definer::Baseline)),
        }
    }

    /// True if any active patch defines this key, directly or through a clone.
    fn is_patched_by(&self, active: &[ConfigPatchIndex]) -> bool {
        self.overrides.iter().any(|slot| active.contains(&slot.patch_index))
    }
}

impl LibraryDeduplicationStorage {

    fn new(entry_name: &str, item_type: &str, aliases: IndexMap<String, String>) -> Self {
        Self {
            entry_name: entry_name.to_owned(),
            item_type: item_type.to_owned(),
            aliases,
            entries: IndexMap::new(),
            patch_infos: vec![],
        }
    }

    /// This function resolves a possibly-aliased key to the real key, if the item exists at all.
    pub fn resolve_key<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        if self.entries.contains_key(key) {
            return Some(key);
        }
        self.aliases.get(key).map(String::as_str).filter(|real| self.entries.contains_key(*real))
    }

    /// This function implements the specialization accessor over one key.
    pub fn try_get_item(&self, key: &str, active: &[ConfigPatchIndex]) -> Option<Arc<ConfigItem>> {
        let real_key = self.resolve_key(key)?;
        self.entries.get(real_key)?.active_data(active).map(|(data, _)| data.item.clone())
    }

    /// The keys live in a specialization with the provided active patches, in order: baseline
    /// keys in sheet order, then active appended keys in patch order.
    pub fn live_keys(&self, active: &[ConfigPatchIndex]) -> Vec<&str> {
        self.entries.iter()
            .filter(|(_, entry)| entry.baseline.is_some() || entry.is_patched_by(active))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    fn patch_info_mut(&mut self, index: ConfigPatchIndex) -> &mut PatchInfo {
        let position = index.0 as usize;
        while self.patch_infos.len() <= position {
            self.patch_infos.push(PatchInfo::default());
        }
        &mut self.patch_infos[position]
    }
}

impl DeduplicationStorage {

    //---------------------------------------------------------------------------//
    //                              Construction
    //---------------------------------------------------------------------------//

    /// This function builds the store from a bound baseline config.
    ///
    /// References are canonicalized and resolved, the reverse graph is computed, and post-load
    /// hooks run. After this the baseline items are frozen.
    pub fn from_baseline(registry: Arc<SchemaRegistry>, baseline: GameConfig, hooks: &PostLoadRegistry) -> Result<Self> {
        let mut storage = Self {
            registry,
            patch_id_to_index: IndexMap::new(),
            libraries: IndexMap::new(),
            key_values: IndexMap::new(),
            baseline_references: HashMap::new(),
            baseline_reverse_references: HashMap::new(),
        };

        let (libraries, key_values) = (baseline.libraries().clone(), baseline.key_values().clone());

        // First pass: move every item in, so references can be canonicalized against the full
        // key and alias sets.
        for library in libraries.values() {
            let mut storage_library = LibraryDeduplicationStorage::new(library.entry_name(), library.item_type(), library.aliases().clone());
            for (key, item) in library.items() {
                storage_library.entries.insert(key.clone(), PatchedItemEntry {
                    baseline: Some(ItemData::new(item.clone(), None)),
                    overrides: vec![],
                });
            }
            storage.libraries.insert(library.entry_name().clone(), storage_library);
        }

        for structure in key_values.values() {
            storage.key_values.insert(structure.entry_name().clone(), KeyValueDeduplicationStorage {
                baseline: structure.clone(),
                patches: vec![],
            });
        }

        // Second pass: canonical reference sets and the reverse graph.
        let mut all_references = HashMap::new();
        for (entry_name, library) in &storage.libraries {
            for (key, entry) in &library.entries {
                let data = entry.baseline.as_ref().unwrap();
                let id = ConfigItemId::new(entry_name, key);
                let references = storage.collect_references(&data.item)?;
                if let Some(references) = &references {
                    for target in references {
                        storage.baseline_reverse_references.entry(target.clone()).or_insert_with(HashSet::new).insert(id.clone());
                    }
                    storage.baseline_references.insert(id.clone(), references.clone());
                }
                all_references.insert(id, references);
            }
        }
        for (entry_name, library) in &mut storage.libraries {
            for (key, entry) in &mut library.entries {
                let id = ConfigItemId::new(entry_name, key);
                if let Some(references) = all_references.remove(&id) {
                    entry.baseline.as_mut().unwrap().references = references;
                }
            }
        }

        // Post-load, then freeze by resolving references to baseline instances.
        for library in storage.libraries.values_mut() {
            if let Some(hook) = hooks.get(&library.entry_name) {
                for entry in library.entries.values_mut() {
                    let data = entry.baseline.as_mut().unwrap();
                    let item = Arc::get_mut(&mut data.item)
                        .ok_or_else(|| CfgLibError::InvariantViolated("post-load ran on an already shared baseline item".to_owned()))?;
                    hook(item);
                }
            }
        }

        let baseline_items = storage.libraries.iter()
            .flat_map(|(entry_name, library)| library.entries.iter()
                .filter_map(|(key, entry)| entry.baseline.as_ref().map(|data| (ConfigItemId::new(entry_name, key), data.item.clone()))))
            .collect::<Vec<_>>();
        for (_, item) in &baseline_items {
            storage.resolve_item_refs(item, &[], &HashMap::new())?;
        }

        Ok(storage)
    }

    /// This function imports one variant's patch envelope into the store.
    ///
    /// The patch's own items become direct overrides; every baseline item whose references
    /// would otherwise cross into the wrong instance is cloned as an indirect override.
    pub fn import_patch(&mut self, id: &ExperimentVariantPair, envelope: &PatchEnvelope, hooks: &PostLoadRegistry) -> Result<()> {
        if self.patch_id_to_index.contains_key(id) {
            return Err(CfgLibError::InvariantViolated(format!("the patch {id} was imported twice")));
        }
        let patch_index = ConfigPatchIndex(self.patch_id_to_index.len() as u32);
        self.patch_id_to_index.insert(id.clone(), patch_index);

        // Decode and validate every entry patch before touching the store.
        let registry = self.registry.clone();
        let codec = TaggedCodec::new(&registry);
        let mut library_patches = vec![];
        for (entry_name, bytes) in envelope.entries() {
            let entry = registry.entry(entry_name)?;
            match codec.decode_entry_patch(entry, &mut Cursor::new(bytes))? {
                EntryPatch::Library(patch) => {
                    self.validate_library_patch(&patch)?;
                    library_patches.push(patch);
                },
                EntryPatch::Structure(patch) => {
                    let storage = self.key_values.get_mut(entry_name)
                        .ok_or_else(|| CfgLibError::UnknownEntry(entry_name.clone()))?;
                    storage.patches.push((patch_index, patch));
                },
            }
        }

        // Direct overrides first, so references to appended keys canonicalize.
        for patch in &library_patches {
            let library = self.libraries.get_mut(patch.entry_name())
                .ok_or_else(|| CfgLibError::UnknownEntry(patch.entry_name().clone()))?;

            for (key, item) in patch.replaced() {
                library.entries.get_mut(key).unwrap().overrides.push(PatchOverride {
                    patch_index,
                    data: ItemData::new(item.clone(), None),
                    directly_patched: true,
                });
                library.patch_info_mut(patch_index).directly_patched.insert(key.clone());
            }

            for (key, item) in patch.appended() {
                library.entries.entry(key.clone()).or_default().overrides.push(PatchOverride {
                    patch_index,
                    data: ItemData::new(item.clone(), None),
                    directly_patched: true,
                });
                let info = library.patch_info_mut(patch_index);
                info.directly_patched.insert(key.clone());
                info.appended.insert(key.clone());
            }
        }

        // Canonical reference sets of the direct overrides.
        let mut direct_ids = vec![];
        for patch in &library_patches {
            for key in patch.replaced().keys().chain(patch.appended().keys()) {
                direct_ids.push(ConfigItemId::new(patch.entry_name(), key));
            }
        }
        for id in &direct_ids {
            let references = {
                let entry = &self.libraries[id.entry()].entries[id.key()];
                self.collect_references(&entry.overrides.last().unwrap().data.item)?
            };
            let entry = self.libraries.get_mut(id.entry()).unwrap().entries.get_mut(id.key()).unwrap();
            entry.overrides.last_mut().unwrap().data.references = references;
        }

        // Reference-driven duplication: clone the baseline items this patch pulls out of shape.
        let active = [patch_index];
        let duplicates = self.compute_duplication_set(&active, DuplicationOwnership::SinglePatch(patch_index));
        info!("Patch {id}: {} directly patched, {} duplicated indirectly.", direct_ids.len(), duplicates.len());

        for duplicate_id in &duplicates {
            let clone = {
                let entry = &self.libraries[duplicate_id.entry()].entries[duplicate_id.key()];
                let baseline = entry.baseline.as_ref()
                    .ok_or_else(|| CfgLibError::InvariantViolated(format!("the appended item {duplicate_id} entered the duplication closure")))?;

                // The clone resets every resolved reference slot; ids are unchanged.
                ItemData::new(Arc::new((*baseline.item).clone()), baseline.references.clone())
            };

            let library = self.libraries.get_mut(duplicate_id.entry()).unwrap();
            library.entries.get_mut(duplicate_id.key()).unwrap().overrides.push(PatchOverride {
                patch_index,
                data: clone,
                directly_patched: false,
            });
            library.patch_info_mut(patch_index).indirectly_patched.insert(duplicate_id.key().clone());
        }

        // Post-load on everything this patch owns, then resolve their references within the
        // patch's world.
        let owned = direct_ids.iter().cloned().chain(duplicates.iter().cloned()).collect::<Vec<_>>();
        for id in &owned {
            if let Some(hook) = hooks.get(id.entry()) {
                let entry = self.libraries.get_mut(id.entry()).unwrap().entries.get_mut(id.key()).unwrap();
                let slot = entry.overrides.iter_mut().rev().find(|slot| slot.patch_index == patch_index).unwrap();
                let item = Arc::get_mut(&mut slot.data.item)
                    .ok_or_else(|| CfgLibError::InvariantViolated("post-load ran on an already shared patched item".to_owned()))?;
                hook(item);
            }
        }
        for id in &owned {
            let item = {
                let entry = &self.libraries[id.entry()].entries[id.key()];
                entry.overrides.iter().rev().find(|slot| slot.patch_index == patch_index).unwrap().data.item.clone()
            };
            self.resolve_item_refs(&item, &active, &HashMap::new())?;
        }

        Ok(())
    }

    fn validate_library_patch(&self, patch: &LibraryPatch) -> Result<()> {
        let library = self.libraries.get(patch.entry_name())
            .ok_or_else(|| CfgLibError::UnknownEntry(patch.entry_name().clone()))?;

        for key in patch.replaced().keys() {
            if !library.entries.get(key).is_some_and(|entry| entry.baseline.is_some()) {
                return Err(CfgLibError::PatchReplacedKeyMissing(patch.entry_name().clone(), key.clone()));
            }
        }
        for key in patch.appended().keys() {
            if library.entries.get(key).is_some_and(|entry| entry.baseline.is_some()) {
                return Err(CfgLibError::PatchAppendedKeyExists(patch.entry_name().clone(), key.clone()));
            }
        }
        Ok(())
    }

    //---------------------------------------------------------------------------//
    //                              Lookup
    //---------------------------------------------------------------------------//

    /// This function returns the index of the provided patch id, if imported.
    pub fn patch_index(&self, id: &ExperimentVariantPair) -> Option<ConfigPatchIndex> {
        self.patch_id_to_index.get(id).copied()
    }

    /// This function returns the library half of the store for the provided entry.
    pub fn library(&self, entry_name: &str) -> Option<&LibraryDeduplicationStorage> {
        self.libraries.get(entry_name)
    }

    fn item_data(&self, id: &ConfigItemId, active: &[ConfigPatchIndex]) -> Option<(&ItemData, Definer)> {
        self.libraries.get(id.entry())?.entries.get(id.key())?.active_data(active)
    }

    fn definer(&self, id: &ConfigItemId, active: &[ConfigPatchIndex]) -> Option<Definer> {
        self.item_data(id, active).map(|(_, definer)| definer)
    }

    /// Canonicalizes one authored reference: alias-resolved, against baseline and appended keys.
    fn canonical_ref(&self, target_entry: &str, raw_key: &str) -> Result<ConfigItemId> {
        let library = self.libraries.get(target_entry)
            .ok_or_else(|| CfgLibError::UnknownEntry(target_entry.to_owned()))?;
        let real_key = library.resolve_key(raw_key)
            .ok_or_else(|| CfgLibError::UnresolvableKey(target_entry.to_owned(), raw_key.to_owned()))?;
        Ok(ConfigItemId::new(target_entry, real_key))
    }

    /// Collects and canonicalizes every reference of one item.
    fn collect_references(&self, item: &ConfigItem) -> Result<Option<HashSet<ConfigItemId>>> {
        let mut raw_refs = vec![];
        item.walk_refs(&mut |meta_ref: &MetaRef| raw_refs.push((meta_ref.target_entry().to_owned(), meta_ref.raw_key().to_owned())));

        if raw_refs.is_empty() {
            return Ok(None);
        }

        let mut references = HashSet::with_capacity(raw_refs.len());
        for (target_entry, raw_key) in raw_refs {
            references.insert(self.canonical_ref(&target_entry, &raw_key)?);
        }
        Ok(Some(references))
    }

    /// Resolves every reference of one item instance to the instances its world serves.
    ///
    /// `exclusive` wins over patch overrides, which win over baseline, mirroring the
    /// specialization accessor.
    fn resolve_item_refs(
        &self,
        item: &Arc<ConfigItem>,
        active: &[ConfigPatchIndex],
        exclusive: &HashMap<ConfigItemId, Arc<ConfigItem>>,
    ) -> Result<()> {
        let mut failure = None;
        item.walk_refs(&mut |meta_ref: &MetaRef| {
            if failure.is_some() {
                return;
            }
            match self.canonical_ref(meta_ref.target_entry(), meta_ref.raw_key()) {
                Ok(id) => {
                    let target = exclusive.get(&id).cloned()
                        .or_else(|| self.item_data(&id, active).map(|(data, _)| data.item.clone()));
                    match target {
                        Some(target) => { meta_ref.resolve_to(target); },
                        None => failure = Some(CfgLibError::UnresolvableKey(id.entry().clone(), id.key().clone())),
                    }
                },
                Err(error) => failure = Some(error),
            }
        });

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    //---------------------------------------------------------------------------//
    //                              Duplication
    //---------------------------------------------------------------------------//

    /// Reverse-reference lookup of one specialization, without materializing the full map.
    ///
    /// Only items whose incoming edges differ from baseline get an override entry: targets
    /// gained or lost by a directly-patched (or appended) item, whose outgoing edges are the
    /// only id-level difference from the baseline graph. Indirect clones keep their baseline
    /// reference ids, so they never show up here.
    fn reverse_reference_overrides(&self, active: &[ConfigPatchIndex]) -> HashMap<ConfigItemId, HashSet<ConfigItemId>> {
        let mut overrides: HashMap<ConfigItemId, HashSet<ConfigItemId>> = HashMap::new();

        for (entry_name, library) in &self.libraries {
            for (key, entry) in &library.entries {
                let source = ConfigItemId::new(entry_name, key);

                let active_slot = entry.active_override(active);
                let is_direct = active_slot.is_some_and(|slot| slot.directly_patched);
                if !is_direct {
                    continue;
                }

                let new_refs = active_slot.unwrap().data.references.clone().unwrap_or_default();
                let old_refs = entry.baseline.as_ref()
                    .and_then(|data| data.references.clone())
                    .unwrap_or_default();

                for lost in old_refs.difference(&new_refs) {
                    overrides.entry(lost.clone())
                        .or_insert_with(|| self.baseline_reverse_references.get(lost).cloned().unwrap_or_default())
                        .remove(&source);
                }
                for gained in new_refs.difference(&old_refs) {
                    overrides.entry(gained.clone())
                        .or_insert_with(|| self.baseline_reverse_references.get(gained).cloned().unwrap_or_default())
                        .insert(source.clone());
                }
            }
        }

        overrides
    }

    /// This function computes the set of items a specialization must duplicate.
    ///
    /// Roots are the sources of edges that would cross worlds: a baseline-shared item referring
    /// to a patch-defined one, or two different patches on the two ends of one edge. The final
    /// set is the closure of the roots under the reverse-reference graph.
    fn compute_duplication_set(&self, active: &[ConfigPatchIndex], ownership: DuplicationOwnership) -> HashSet<ConfigItemId> {
        let reverse_overrides = self.reverse_reference_overrides(active);
        let reverse_of = |id: &ConfigItemId| -> Option<&HashSet<ConfigItemId>> {
            reverse_overrides.get(id).or_else(|| self.baseline_reverse_references.get(id))
        };

        // Roots.
        let mut roots = HashSet::new();
        for (entry_name, library) in &self.libraries {
            for (key, entry) in &library.entries {
                if !entry.is_patched_by(active) {
                    continue;
                }
                let id = ConfigItemId::new(entry_name, key);
                let (data, definer) = match entry.active_data(active) {
                    Some(found) => found,
                    None => continue,
                };
                let patch = match definer {
                    Definer::Patch(index) => index,
                    Definer::Baseline => continue,
                };

                // Outgoing: this patched item referring into a DIFFERENT patch.
                for target in data.references_iter() {
                    if let Some(Definer::Patch(target_patch)) = self.definer(target, active) {
                        if target_patch != patch {
                            roots.insert(id.clone());
                        }
                    }
                }

                // Incoming: anything still shared with baseline referring to this patched item,
                // or another patch's item doing so.
                if let Some(sources) = reverse_of(&id) {
                    for source in sources {
                        match self.definer(source, active) {
                            Some(Definer::Baseline) => { roots.insert(source.clone()); },
                            Some(Definer::Patch(source_patch)) if source_patch != patch => { roots.insert(source.clone()); },
                            _ => {},
                        }
                    }
                }
            }
        }

        // Closure under reverse references. During single-patch construction the patch's own
        // direct items keep their instances, so the walk stops at them; a standalone
        // specialization clones whatever it reaches, shared or patch-defined.
        let mut result = HashSet::new();
        let mut worklist = roots.into_iter().collect::<Vec<_>>();
        while let Some(id) = worklist.pop() {
            match self.definer(&id, active) {
                Some(Definer::Baseline) => {},
                Some(Definer::Patch(patch)) => match ownership {
                    DuplicationOwnership::SinglePatch(own) => {
                        let is_direct = self.libraries[id.entry()].entries[id.key()]
                            .overrides.iter()
                            .any(|slot| slot.patch_index == own && slot.directly_patched);
                        if patch == own && is_direct {
                            continue;
                        }
                    },
                    DuplicationOwnership::None => {},
                },
                None => continue,
            }

            if !result.insert(id.clone()) {
                continue;
            }
            if let Some(sources) = reverse_of(&id) {
                worklist.extend(sources.iter().cloned());
            }
        }

        result
    }

    //---------------------------------------------------------------------------//
    //                              Specialization
    //---------------------------------------------------------------------------//

    /// This function materializes one specialization from the store.
    ///
    /// With zero or one active patch the store already holds every instance the specialization
    /// needs. With several, items whose references would mix worlds are cloned into the
    /// specialization's exclusively-owned map and re-resolved there.
    pub fn specialize(storage: &Arc<Self>, active_ids: &[ExperimentVariantPair], hooks: &PostLoadRegistry) -> Result<GameConfigSpecialization> {
        let mut active = vec![];
        for id in active_ids {
            let index = storage.patch_index(id)
                .ok_or_else(|| CfgLibError::InvariantViolated(format!("the patch {id} is not part of this storage")))?;
            active.push(index);
        }
        active.sort();

        let mut exclusively_owned = HashMap::new();
        if active.len() > 1 {
            let duplicates = storage.compute_duplication_set(&active, DuplicationOwnership::None);

            for id in &duplicates {
                let (data, _) = storage.item_data(id, &active)
                    .ok_or_else(|| CfgLibError::InvariantViolated(format!("the duplicated item {id} has no active definition")))?;
                let mut clone = (*data.item).clone();
                if let Some(hook) = hooks.get(id.entry()) {
                    hook(&mut clone);
                }
                exclusively_owned.insert(id.clone(), Arc::new(clone));
            }

            for item in exclusively_owned.values() {
                storage.resolve_item_refs(item, &active, &exclusively_owned)?;
            }
        }

        // Key-value structures: clone the baseline and apply the active patches in order.
        let mut key_values = IndexMap::new();
        for (entry_name, storage_entry) in &storage.key_values {
            let schema = storage.registry.struct_schema(storage_entry.baseline.type_name())?;
            let mut structure = storage_entry.baseline.clone();
            for (patch_index, patch) in &storage_entry.patches {
                if active.contains(patch_index) {
                    patch.apply(&mut structure, schema);
                }
            }
            key_values.insert(entry_name.clone(), structure);
        }

        Ok(GameConfigSpecialization {
            storage: storage.clone(),
            active,
            exclusively_owned,
            key_values,
        })
    }
}

impl GameConfigSpecialization {

    /// This function returns the instance of one item as this specialization sees it.
    pub fn item(&self, entry_name: &str, key: &str) -> Option<Arc<ConfigItem>> {
        let library = self.storage.libraries.get(entry_name)?;
        let real_key = library.resolve_key(key)?;

        if let Some(owned) = self.exclusively_owned.get(&ConfigItemId::new(entry_name, real_key)) {
            return Some(owned.clone());
        }
        library.try_get_item(real_key, &self.active)
    }

    /// This function returns the keys of one library as this specialization sees them, in order.
    pub fn library_keys(&self, entry_name: &str) -> Vec<&str> {
        self.storage.libraries.get(entry_name)
            .map(|library| library.live_keys(&self.active))
            .unwrap_or_default()
    }

    /// This function returns one key-value structure with every active patch applied.
    pub fn key_value(&self, entry_name: &str) -> Option<&KeyValueStructure> {
        self.key_values.get(entry_name)
    }

    /// This function returns true if this specialization owns the provided instance exclusively.
    pub fn owns_exclusively(&self, entry_name: &str, key: &str) -> bool {
        self.exclusively_owned.contains_key(&ConfigItemId::new(entry_name, key))
    }
}
