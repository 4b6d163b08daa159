//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the patch model: the per-entry modifications one experiment variant makes to the
//! baseline config.
//!
//! A library patch replaces existing items and appends new ones; a structure patch replaces
//! members of a key-value structure by meta tag. Patches for all entries of one variant travel
//! together in a [`PatchEnvelope`], keyed by entry name, so importers can decode entries lazily.

use getset::Getters;
use indexmap::{IndexMap, IndexSet};

use std::sync::Arc;

use crate::build::log::BuildLog;
use crate::error::{CfgLibError, Result};
use crate::items::{ConfigItem, ConfigValue, KeyValueStructure, Library};
use crate::schema::StructSchema;
use crate::sheets::syntax::RootObject;


//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// The modifications one variant makes to one library entry.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct LibraryPatch {

    /// Name of the patched entry.
    entry_name: String,

    /// Name of the item struct type.
    item_type: String,

    /// Items whose key exists in the baseline, with their new values. Sheet order.
    replaced: IndexMap<String, Arc<ConfigItem>>,

    /// Items whose key does not exist in the baseline. Sheet order.
    appended: IndexMap<String, Arc<ConfigItem>>,
}

/// The modifications one variant makes to one key-value entry.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct StructurePatch {

    /// Name of the patched entry.
    entry_name: String,

    /// Name of the struct type.
    type_name: String,

    /// The new values of the replaced members, keyed by member name.
    replacement_values: IndexMap<String, ConfigValue>,

    /// Meta tags of the replaced members, in replacement order.
    replaced_member_tags: IndexSet<u32>,
}

/// One entry's patch, whichever kind it is.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryPatch {
    Library(LibraryPatch),
    Structure(StructurePatch),
}

/// Every entry patch of one variant, keyed by entry name. This is what a `.mpp` file holds.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct PatchEnvelope {
    entries: IndexMap<String, Vec<u8>>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl LibraryPatch {

    /// This function creates an empty patch for the provided entry.
    pub fn new(entry_name: &str, item_type: &str) -> Self {
        Self { entry_name: entry_name.to_owned(), item_type: item_type.to_owned(), ..Default::default() }
    }

    /// This function builds a patch by diffing one variant's bound items against the baseline.
    ///
    /// Items equal to their baseline counterpart are dropped: an overlay that changes nothing
    /// produces no patch entry at all. The variant items must arrive in sheet order; the order
    /// rule (appends strictly after replacements) has been checked during splitting.
    pub fn from_diff(baseline: &Library, variant_items: &IndexMap<String, Arc<ConfigItem>>) -> Self {
        let mut patch = Self::new(baseline.entry_name(), baseline.item_type());

        for (key, item) in variant_items {
            match baseline.get(key) {
                Some(baseline_item) => {
                    if **baseline_item != **item {
                        patch.replaced.insert(key.clone(), item.clone());
                    }
                },
                None => {
                    patch.appended.insert(key.clone(), item.clone());
                },
            }
        }

        patch
    }

    /// This function rebuilds a patch from its serialized parts, enforcing the invariants.
    pub fn from_parts(
        entry_name: &str,
        item_type: &str,
        replaced: IndexMap<String, Arc<ConfigItem>>,
        appended: IndexMap<String, Arc<ConfigItem>>,
    ) -> Result<Self> {
        for key in appended.keys() {
            if replaced.contains_key(key) {
                return Err(CfgLibError::InvariantViolated(format!("the patch for \"{entry_name}\" both replaces and appends the key \"{key}\"")));
            }
        }
        Ok(Self { entry_name: entry_name.to_owned(), item_type: item_type.to_owned(), replaced, appended })
    }

    /// This function returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.replaced.is_empty() && self.appended.is_empty()
    }

    /// This function checks this patch against a baseline: replacements must hit existing keys,
    /// appends must not.
    pub fn validate_against(&self, baseline: &Library) -> Result<()> {
        for key in self.replaced.keys() {
            if baseline.get(key).is_none() {
                return Err(CfgLibError::PatchReplacedKeyMissing(self.entry_name.clone(), key.clone()));
            }
        }
        for key in self.appended.keys() {
            if baseline.get(key).is_some() {
                return Err(CfgLibError::PatchAppendedKeyExists(self.entry_name.clone(), key.clone()));
            }
        }
        Ok(())
    }

    /// This function applies the patch onto a baseline item map.
    ///
    /// Appends overwrite prior appends of the same key (last writer wins across patches applied
    /// in order), but keep the position the first appending patch gave the key.
    pub fn apply(&self, items: &mut IndexMap<String, Arc<ConfigItem>>) -> Result<()> {
        for (key, item) in &self.replaced {
            match items.get_mut(key) {
                Some(slot) => *slot = item.clone(),
                None => return Err(CfgLibError::PatchReplacedKeyMissing(self.entry_name.clone(), key.clone())),
            }
        }
        for (key, item) in &self.appended {
            items.insert(key.clone(), item.clone());
        }
        Ok(())
    }

    /// This function returns true if the patch appends the provided key.
    pub fn contains_appended(&self, key: &str) -> bool {
        self.appended.contains_key(key)
    }

    /// This function returns the patch's own item for the provided key, if it defines one.
    pub fn resolve(&self, key: &str) -> Option<&Arc<ConfigItem>> {
        self.replaced.get(key).or_else(|| self.appended.get(key))
    }
}

/// This function checks the source-order rule of variant items: every appended item (a variant
/// item whose key is not in the baseline) must come after ALL baseline items of the sheet.
///
/// The roots must be in sheet order, baseline and variant rows interleaved as authored.
pub fn check_variant_append_order(roots: &[RootObject], baseline: &Library, log: &mut BuildLog) {
    let last_non_appended = roots.iter().rposition(|root| {
        root.variant_id().is_none() || baseline.get(&root.key()).is_some()
    });

    let last_non_appended = match last_non_appended {
        Some(index) => index,
        None => return,
    };

    // Point at the appended items themselves: those are the rows the author has to move.
    for offender in &roots[..last_non_appended] {
        if offender.variant_id().is_some() && baseline.get(&offender.key()).is_none() {
            log.error(
                &format!("The variant-appended item \"{}\" appears before baseline or replacing items. Appended variant items must come last.", offender.key()),
                Some(offender.location().clone()),
            );
        }
    }
}

impl StructurePatch {

    /// This function builds a patch by diffing one variant's structure against the baseline.
    ///
    /// Only members present in the overlay and different from the baseline are recorded.
    pub fn from_diff(baseline: &KeyValueStructure, overlay: &KeyValueStructure, schema: &StructSchema) -> Self {
        let mut patch = Self {
            entry_name: baseline.entry_name().clone(),
            type_name: baseline.type_name().clone(),
            ..Default::default()
        };

        for (name, value) in overlay.values() {
            if baseline.value(name) == Some(value) {
                continue;
            }
            if let Some(field) = schema.field_by_name(name) {
                patch.replacement_values.insert(name.clone(), value.clone());
                patch.replaced_member_tags.insert(*field.meta_tag());
            }
        }

        patch
    }

    /// This function rebuilds a patch from member names, rejecting names the type does not have.
    pub fn from_member_names(
        entry_name: &str,
        schema: &StructSchema,
        replacement_values: IndexMap<String, ConfigValue>,
    ) -> Result<Self> {
        let mut replaced_member_tags = IndexSet::new();
        for name in replacement_values.keys() {
            let field = schema.field_by_name(name)
                .ok_or_else(|| CfgLibError::UnknownStructureMember(schema.name().clone(), name.clone()))?;
            replaced_member_tags.insert(*field.meta_tag());
        }
        Ok(Self {
            entry_name: entry_name.to_owned(),
            type_name: schema.name().clone(),
            replacement_values,
            replaced_member_tags,
        })
    }

    /// This function returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.replaced_member_tags.is_empty()
    }

    /// This function applies the patch onto a structure.
    ///
    /// Tags the current schema does not know are skipped without error: a patch built against a
    /// newer schema still applies as far as it can.
    pub fn apply(&self, target: &mut KeyValueStructure, schema: &StructSchema) {
        for tag in &self.replaced_member_tags {
            let field = match schema.field_by_tag(*tag) {
                Some(field) => field,
                None => continue,
            };
            if let Some(value) = self.replacement_values.get(field.name()) {
                target.set_value(field.name(), value.clone());
            }
        }
    }
}

impl PatchEnvelope {

    /// This function creates an empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// This function adds one entry's serialized patch to the envelope.
    pub fn insert(&mut self, entry_name: &str, data: Vec<u8>) {
        self.entries.insert(entry_name.to_owned(), data);
    }

    /// This function returns the serialized patch of the provided entry, if present.
    pub fn entry_bytes(&self, entry_name: &str) -> Option<&[u8]> {
        self.entries.get(entry_name).map(Vec::as_slice)
    }

    /// This function returns true if the envelope holds no patches.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
